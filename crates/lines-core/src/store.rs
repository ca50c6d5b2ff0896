//! LineStore trait - current value lookup for every sport
//!
//! The store is written by the lines fetcher (one writer per sport) and read
//! concurrently by every subscription session.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::Point;

/// Storage for the latest line of every sport
#[async_trait]
pub trait LineStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Record a new point for a sport, replacing the current one
    async fn put_point(&self, sport: &str, point: Point) -> StoreResult<()>;

    /// Latest point for a sport
    ///
    /// Returns `StoreError::NotFound` for sports that were never written.
    async fn current(&self, sport: &str) -> StoreResult<Point>;
}

/// In-memory `LineStore`, last write wins
#[derive(Debug, Default)]
pub struct MemoryLineStore {
    points: RwLock<HashMap<String, Point>>,
}

impl MemoryLineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sports with at least one point
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }
}

#[async_trait]
impl LineStore for MemoryLineStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn put_point(&self, sport: &str, point: Point) -> StoreResult<()> {
        debug!(sport, value = point.value, "Storing point");
        self.points.write().insert(sport.to_string(), point);
        Ok(())
    }

    async fn current(&self, sport: &str) -> StoreResult<Point> {
        self.points
            .read()
            .get(sport)
            .copied()
            .ok_or_else(|| StoreError::NotFound(sport.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_current() {
        let store = MemoryLineStore::new();
        assert!(store.is_empty());

        store.put_point("soccer", Point::now(1.5)).await.unwrap();
        store.put_point("soccer", Point::now(2.25)).await.unwrap();

        let point = store.current("soccer").await.unwrap();
        assert_eq!(point.value, 2.25);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_sport() {
        let store = MemoryLineStore::new();
        let result = store.current("baseball").await;
        assert!(matches!(result, Err(StoreError::NotFound(s)) if s == "baseball"));
    }
}
