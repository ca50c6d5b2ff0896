//! lines-api - HTTP/WebSocket API for sports lines subscriptions
//!
//! Serves the readiness gate and the subscription endpoint. Every accepted
//! WebSocket runs its own `SubscriptionSession` against the shared store.
//!
//! # Usage
//!
//! ```ignore
//! use lines_api::{create_router, serve, AppState};
//!
//! let state = AppState::new(store);
//! let router = create_router(state.clone());
//! serve(listener, router, state.shutdown().clone()).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod state;
pub mod transport;

pub use error::ApiError;
pub use state::{AppState, ReadyFlag};

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Create the lines API router with the given application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Readiness gate
        .route("/ready", get(handlers::ready::ready))
        // Subscription stream
        .route("/v1/lines/subscribe", get(handlers::subscribe::subscribe))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` until `shutdown` is cancelled.
///
/// Open subscriptions are expected to watch a child of the same token, so
/// they end together with the listener.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use lines_core::MemoryLineStore;
    use tower::ServiceExt;

    use handlers::ready::ReadyStatus;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryLineStore::new()))
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = fetch(create_router(state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_ready_flips() {
        let state = state();

        let (status, body) = fetch(create_router(state.clone()), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let ready: ReadyStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(ready.status, "not ok");

        state.ready().set(true);

        let (status, body) = fetch(create_router(state), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        let ready: ReadyStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(ready.status, "ok");
    }

    #[tokio::test]
    async fn test_states_are_independent() {
        let first = state();
        let second = state();
        first.ready().set(true);
        assert!(!second.ready().is_ready());
    }
}
