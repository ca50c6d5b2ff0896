//! Push side of a session: owns the baseline and the timer, and sends deltas.

use std::sync::Arc;

use futures::{Sink, SinkExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::delta::compute_deltas;
use crate::error::{SessionError, SessionResult, TransportError};
use crate::models::{Baseline, SubscriptionResponse};
use crate::reconcile::{reconcile, Requirement};
use crate::store::LineStore;

enum Event {
    Finish,
    Requirement(Option<Requirement>),
    Tick,
}

pub(crate) struct PushLoop<O> {
    session_id: String,
    store: Arc<dyn LineStore>,
    outgoing: O,
    requirements: mpsc::Receiver<Requirement>,
    finish: oneshot::Receiver<()>,
    baseline: Baseline,
    /// None until the first requirement arrives
    timer: Option<Interval>,
}

impl<O> PushLoop<O>
where
    O: Sink<SubscriptionResponse, Error = TransportError> + Unpin,
{
    pub(crate) fn new(
        session_id: String,
        store: Arc<dyn LineStore>,
        outgoing: O,
        requirements: mpsc::Receiver<Requirement>,
        finish: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            session_id,
            store,
            outgoing,
            requirements,
            finish,
            baseline: Baseline::default(),
            timer: None,
        }
    }

    pub(crate) async fn run(mut self) -> SessionResult<()> {
        loop {
            let event = tokio::select! {
                biased;
                // A dropped sender counts as a finish signal too
                _ = &mut self.finish => Event::Finish,
                requirement = self.requirements.recv() => Event::Requirement(requirement),
                _ = next_tick(&mut self.timer) => Event::Tick,
            };

            match event {
                Event::Finish | Event::Requirement(None) => {
                    debug!(session_id = %self.session_id, "Push loop finished");
                    break;
                }
                Event::Requirement(Some(requirement)) => self.apply(requirement),
                Event::Tick if self.baseline.is_empty() => continue,
                Event::Tick => {}
            }

            // Termination preempts a push stuck on a client that stopped reading
            let finished = tokio::select! {
                biased;
                _ = &mut self.finish => true,
                result = push(
                    &self.session_id,
                    self.store.as_ref(),
                    &mut self.outgoing,
                    &mut self.baseline,
                ) => {
                    result?;
                    false
                }
            };
            if finished {
                debug!(session_id = %self.session_id, "Push loop finished during a push");
                break;
            }
        }

        self.timer = None;
        Ok(())
    }

    /// Switch cadence and, if the sports changed, restart the baseline at zero
    fn apply(&mut self, requirement: Requirement) {
        // Release the superseded timer before installing the new one
        self.timer = None;
        let mut timer = interval_at(Instant::now() + requirement.interval, requirement.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);

        let reconciliation = reconcile(&self.baseline.key_set(), &requirement.sports);
        if reconciliation.reset_baseline {
            self.baseline = Baseline::zeroed(&requirement.sports);
        }

        debug!(
            session_id = %self.session_id,
            interval_secs = requirement.interval.as_secs(),
            sports = requirement.sports.len(),
            reset_baseline = reconciliation.reset_baseline,
            "Requirement applied"
        );
    }
}

/// One push cycle. Store failures are logged and skipped; a failed send
/// ends the loop.
async fn push<O>(
    session_id: &str,
    store: &dyn LineStore,
    outgoing: &mut O,
    baseline: &mut Baseline,
) -> SessionResult<()>
where
    O: Sink<SubscriptionResponse, Error = TransportError> + Unpin,
{
    if baseline.is_empty() {
        return Ok(());
    }

    let (deltas, next) = match compute_deltas(baseline, store).await {
        Ok(result) => result,
        Err(e) => {
            warn!(%session_id, error = %e, "Failed to read current lines, skipping push");
            return Ok(());
        }
    };

    if let Err(e) = outgoing.send(SubscriptionResponse { deltas }).await {
        warn!(%session_id, error = %e, "Error occurred while sending deltas to client");
        return Err(SessionError::Send(e));
    }

    *baseline = next;
    Ok(())
}

/// Next tick of the current timer, or never if there is none
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
