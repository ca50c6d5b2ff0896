//! Error types for stores and subscription sessions

use thiserror::Error;

/// Result type for value store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for a subscription session
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by a `LineStore`
#[derive(Debug, Error)]
pub enum StoreError {
    /// No point has been written for this sport yet
    #[error("Line not found for sport: {0}")]
    NotFound(String),

    /// Store is not reachable
    ///
    /// Never returned by `MemoryLineStore`; stores backed by a database or a
    /// remote service report connection failures with it.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the transport carrying a subscription stream
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading the next client message failed
    #[error("Receive error: {0}")]
    Receive(String),

    /// Client message could not be decoded
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// Writing a response to the client failed
    #[error("Send error: {0}")]
    Send(String),
}

/// Errors that end a subscription session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Client asked for updates with a zero interval
    #[error("Client tried to subscribe on sport lines with zero interval")]
    ZeroInterval,

    /// Reading from the client failed
    #[error("Failed to receive subscription request: {0}")]
    Receive(#[source] TransportError),

    /// Pushing deltas to the client failed
    #[error("Failed to send deltas: {0}")]
    Send(#[source] TransportError),

    /// The connection was cancelled by its owner
    #[error("Subscription cancelled")]
    Cancelled,

    /// Push loop task panicked or was aborted
    #[error("Push loop failed: {0}")]
    PushLoop(String),
}

impl SessionError {
    /// Whether the session ended because the client broke the protocol
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, SessionError::ZeroInterval)
    }
}
