//! Application state for the lines API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lines_core::LineStore;
use tokio_util::sync::CancellationToken;

/// Readiness gate exposed on `/ready`
#[derive(Debug, Clone, Default)]
pub struct ReadyFlag(Arc<AtomicBool>);

impl ReadyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Current lines, read by every subscription session
    store: Arc<dyn LineStore>,
    /// Set once every sport was synchronized
    ready: ReadyFlag,
    /// Cancelled on server shutdown; every session runs on a child token
    shutdown: CancellationToken,
}

impl AppState {
    /// Create a new AppState; not ready until `ready().set(true)`
    pub fn new(store: Arc<dyn LineStore>) -> Self {
        Self {
            store,
            ready: ReadyFlag::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an externally owned shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn store(&self) -> Arc<dyn LineStore> {
        self.store.clone()
    }

    pub fn ready(&self) -> &ReadyFlag {
        &self.ready
    }

    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}
