//! Data models shared by the store, the sessions and the wire protocol

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-sport change since the previous push
pub type Deltas = HashMap<String, f64>;

/// Value of a sport line at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl Point {
    /// Point stamped with the current time
    pub fn now(value: f64) -> Self {
        Self {
            time: Utc::now(),
            value,
        }
    }
}

/// Client -> server message
///
/// Every message replaces the previous one: the client declares the full
/// set of sports it wants and the push interval in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Sports to track
    #[serde(default)]
    pub sports: Vec<String>,
    /// Push interval in seconds, must be non-zero
    #[serde(default)]
    pub interval: u32,
}

impl SubscriptionRequest {
    pub fn new<I, S>(sports: I, interval: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sports: sports.into_iter().map(Into::into).collect(),
            interval,
        }
    }
}

/// Server -> client message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub deltas: Deltas,
}

/// Values as of the last successful push, one per tracked sport.
///
/// The key set of a baseline is the set of sports a session tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    values: HashMap<String, f64>,
}

impl Baseline {
    /// Baseline with every sport at zero, so the next push reports full values
    pub fn zeroed<'a, I>(sports: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        Self {
            values: sports.into_iter().map(|s| (s.clone(), 0.0)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, sport: &str) -> Option<f64> {
        self.values.get(sport).copied()
    }

    /// Sports currently tracked
    pub fn key_set(&self) -> HashSet<String> {
        self.values.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }
}

impl From<HashMap<String, f64>> for Baseline {
    fn from(values: HashMap<String, f64>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_json() {
        let request: SubscriptionRequest =
            serde_json::from_value(json!({"sports": ["soccer", "tennis"], "interval": 3}))
                .unwrap();
        assert_eq!(request, SubscriptionRequest::new(["soccer", "tennis"], 3));
    }

    #[test]
    fn test_request_defaults() {
        // Missing fields fall back to defaults
        let request: SubscriptionRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.sports.is_empty());
        assert_eq!(request.interval, 0);
    }

    #[test]
    fn test_response_to_json() {
        let mut deltas = Deltas::new();
        deltas.insert("soccer".to_string(), 1.5);
        let value = serde_json::to_value(SubscriptionResponse { deltas }).unwrap();
        assert_eq!(value, json!({"deltas": {"soccer": 1.5}}));
    }

    #[test]
    fn test_zeroed_baseline() {
        let sports = vec!["soccer".to_string(), "tennis".to_string()];
        let baseline = Baseline::zeroed(&sports);
        assert_eq!(baseline.len(), 2);
        assert_eq!(baseline.get("soccer"), Some(0.0));
        assert_eq!(baseline.get("tennis"), Some(0.0));
        assert_eq!(baseline.get("baseball"), None);
    }
}
