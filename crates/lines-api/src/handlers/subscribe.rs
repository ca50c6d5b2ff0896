//! Subscription handler
//!
//! Upgrades to a WebSocket and runs one `SubscriptionSession` per connection.

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use lines_core::{SessionError, SubscriptionSession};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::transport::split_socket;

/// GET /v1/lines/subscribe
///
/// Client sends `{"sports": [...], "interval": <seconds>}` at any time;
/// server pushes `{"deltas": {...}}` every interval.
pub async fn subscribe(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if state.shutdown().is_cancelled() {
        return Err(ApiError::ServiceUnavailable(
            "Server is shutting down".to_string(),
        ));
    }
    if !state.ready().is_ready() {
        return Err(ApiError::ServiceUnavailable(
            "Lines are not synchronized yet".to_string(),
        ));
    }

    Ok(ws.on_upgrade(move |socket| run_session(state, socket)))
}

async fn run_session(state: AppState, socket: WebSocket) {
    let session = SubscriptionSession::new(state.store());
    let session_id = session.id().to_string();
    let (incoming, outgoing) = split_socket(socket);

    match session
        .run(incoming, outgoing, state.shutdown().child_token())
        .await
    {
        Ok(()) => info!(%session_id, "Subscription closed by client"),
        Err(SessionError::Cancelled) => debug!(%session_id, "Subscription cancelled"),
        Err(e) if e.is_protocol_violation() => {
            warn!(%session_id, error = %e, "Subscription rejected")
        }
        Err(e) => warn!(%session_id, error = %e, "Subscription terminated"),
    }
}
