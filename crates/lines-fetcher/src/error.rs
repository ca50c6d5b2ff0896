//! Error types for the lines fetcher

use lines_core::StoreError;
use thiserror::Error;

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors raised while fetching a sport line
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider URL is not valid
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Provider answered with a non-success status
    #[error("Provider returned {status} for sport {sport}")]
    Status { sport: String, status: u16 },

    /// Provider response does not contain the sport
    #[error("Failed to parse response: no line for sport {0}")]
    MissingSport(String),

    /// Line value is not a number
    #[error("Invalid line value for sport {sport}: {value}")]
    InvalidValue { sport: String, value: String },

    /// Writing the point failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
