//! Delta calculation between a session baseline and the store

use std::collections::HashMap;

use crate::error::StoreResult;
use crate::models::{Baseline, Deltas};
use crate::store::LineStore;

/// Compute per-sport deltas against `baseline` and the baseline that follows
/// a successful push.
///
/// Every tracked sport is read from the store. A single failed read fails the
/// whole cycle: the error is returned and the caller keeps its baseline.
pub async fn compute_deltas(
    baseline: &Baseline,
    store: &dyn LineStore,
) -> StoreResult<(Deltas, Baseline)> {
    let mut deltas = Deltas::with_capacity(baseline.len());
    let mut next = HashMap::with_capacity(baseline.len());

    for (sport, previous) in baseline.iter() {
        let current = store.current(sport).await?.value;
        deltas.insert(sport.clone(), current - previous);
        next.insert(sport.clone(), current);
    }

    Ok((deltas, Baseline::from(next)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::Point;
    use crate::store::MemoryLineStore;
    use pretty_assertions::assert_eq;

    fn sports(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_deltas_from_zero_baseline() {
        let store = MemoryLineStore::new();
        store.put_point("soccer", Point::now(1.5)).await.unwrap();
        store.put_point("tennis", Point::now(2.0)).await.unwrap();

        let baseline = Baseline::zeroed(&sports(&["soccer", "tennis"]));
        let (deltas, next) = compute_deltas(&baseline, &store).await.unwrap();

        assert_eq!(deltas.get("soccer"), Some(&1.5));
        assert_eq!(deltas.get("tennis"), Some(&2.0));
        assert_eq!(next.get("soccer"), Some(1.5));
        assert_eq!(next.get("tennis"), Some(2.0));
    }

    #[tokio::test]
    async fn test_deltas_against_previous_values() {
        let store = MemoryLineStore::new();
        store.put_point("tennis", Point::now(2.5)).await.unwrap();

        let mut values = HashMap::new();
        values.insert("tennis".to_string(), 2.0);
        let baseline = Baseline::from(values);

        let (deltas, next) = compute_deltas(&baseline, &store).await.unwrap();
        assert_eq!(deltas.get("tennis"), Some(&0.5));
        assert_eq!(next.get("tennis"), Some(2.5));
    }

    #[tokio::test]
    async fn test_failed_read_fails_whole_cycle() {
        let store = MemoryLineStore::new();
        store.put_point("soccer", Point::now(1.5)).await.unwrap();

        let baseline = Baseline::zeroed(&sports(&["soccer", "baseball"]));
        let result = compute_deltas(&baseline, &store).await;

        assert!(matches!(result, Err(StoreError::NotFound(s)) if s == "baseball"));
        // Caller's baseline is untouched
        assert_eq!(baseline.get("soccer"), Some(0.0));
    }
}
