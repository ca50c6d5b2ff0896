//! Requirements declared by a client and their reconciliation with the
//! sports a session already tracks.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::SessionError;
use crate::models::SubscriptionRequest;

/// Validated subscription requirement: what to push and how often
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub interval: Duration,
    pub sports: HashSet<String>,
}

impl Requirement {
    /// Build a requirement, rejecting a zero interval
    pub fn new(sports: HashSet<String>, interval: Duration) -> Result<Self, SessionError> {
        if interval.is_zero() {
            return Err(SessionError::ZeroInterval);
        }
        Ok(Self { interval, sports })
    }
}

impl TryFrom<SubscriptionRequest> for Requirement {
    type Error = SessionError;

    fn try_from(request: SubscriptionRequest) -> Result<Self, Self::Error> {
        Self::new(
            request.sports.into_iter().collect(),
            Duration::from_secs(u64::from(request.interval)),
        )
    }
}

/// Outcome of reconciling a new requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Baseline must restart from zero for the requested sports
    pub reset_baseline: bool,
}

/// Decide whether a new set of sports forces a full resync.
///
/// Any difference between the sets resets the baseline; an identical set
/// (in any order) only changes the push cadence.
pub fn reconcile(tracked: &HashSet<String>, requested: &HashSet<String>) -> Reconciliation {
    Reconciliation {
        reset_baseline: tracked != requested,
    }
}
