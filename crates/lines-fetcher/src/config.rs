//! Fetcher configuration

use std::collections::HashMap;
use std::time::Duration;

/// Default timeout for a single provider request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for `LinesFetcher`
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Provider base URL (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Polling interval per sport
    pub sports: HashMap<String, Duration>,
    /// Timeout for a single provider request
    pub request_timeout: Duration,
}

impl FetcherConfig {
    pub fn new(base_url: impl Into<String>, sports: HashMap<String, Duration>) -> Self {
        Self {
            base_url: base_url.into(),
            sports,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
