//! Integration tests for the sports lines service
//!
//! End-to-end tests that exercise the full stack:
//! - Lines fetcher polling a mock provider into the store
//! - HTTP readiness gate
//! - WebSocket subscription sessions
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lines-tests
//! ```
//!
//! # Test Structure
//!
//! - `subscription_e2e_test.rs` - WebSocket subscriptions against a seeded store
//! - `daemon_flow_test.rs` - Provider -> fetcher -> readiness -> subscription

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use lines_api::{create_router, AppState};
use lines_core::{LineStore, SubscriptionRequest, SubscriptionResponse};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// A lines API server on a random port that shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server that already accepts subscriptions
    pub async fn start(store: Arc<dyn LineStore>) -> std::io::Result<Self> {
        let server = Self::start_unready(store).await?;
        server.state.ready().set(true);
        Ok(server)
    }

    /// Start a server whose readiness flag is still down
    pub async fn start_unready(store: Arc<dyn LineStore>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = AppState::new(store);
        let router = create_router(state.clone());
        let shutdown = state.shutdown().clone();

        let handle = tokio::spawn(async move {
            lines_api::serve(listener, router, shutdown).await.ok();
        });

        Ok(Self {
            addr,
            state,
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the subscription endpoint
    pub fn subscribe_url(&self) -> String {
        format!("ws://{}/v1/lines/subscribe", self.addr)
    }

    /// Cancel open sessions and wait for the server to stop
    pub async fn shutdown(mut self) {
        self.state.shutdown().cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.state.shutdown().cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Mock upstream lines provider serving `GET /api/v1/lines/{sport}`
///
/// Lines are stored under upper-cased sport names, the way the real
/// provider keys them. Unknown sports get a 404.
pub struct MockProvider {
    pub addr: SocketAddr,
    lines: Arc<RwLock<HashMap<String, String>>>,
    handle: JoinHandle<()>,
}

impl MockProvider {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let lines = Arc::new(RwLock::new(HashMap::new()));
        let app = Router::new()
            .route("/api/v1/lines/{sport}", get(provider_lines))
            .with_state(lines.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            lines,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Set the line the provider returns for `sport`
    pub fn set_line(&self, sport: &str, value: &str) {
        self.lines
            .write()
            .insert(sport.to_uppercase(), value.to_string());
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn provider_lines(
    State(lines): State<Arc<RwLock<HashMap<String, String>>>>,
    Path(sport): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let key = sport.to_uppercase();
    let value = lines.read().get(&key).cloned().ok_or(StatusCode::NOT_FOUND)?;
    let line = HashMap::from([(key, value)]);
    Ok(Json(json!({ "lines": line })))
}

/// WebSocket client for the subscription endpoint
pub struct SubscriptionClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SubscriptionClient {
    pub async fn connect(url: &str) -> Result<Self, tungstenite::Error> {
        let (socket, _) = tokio_tungstenite::connect_async(url).await?;
        Ok(Self { socket })
    }

    /// Send a subscription request
    pub async fn subscribe(
        &mut self,
        sports: &[&str],
        interval: u32,
    ) -> Result<(), tungstenite::Error> {
        let request = SubscriptionRequest::new(sports.iter().copied(), interval);
        self.send_raw(&json!(request).to_string()).await
    }

    /// Send an arbitrary text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<(), tungstenite::Error> {
        self.socket.send(Message::Text(text.to_string())).await
    }

    /// Next pushed response, or `None` on timeout or closed stream
    pub async fn next_response(&mut self, timeout: Duration) -> Option<SubscriptionResponse> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.socket.next())
                .await
                .ok()??;
            match frame.ok()? {
                Message::Text(text) => return serde_json::from_str(&text).ok(),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Whether the server ends the stream within `timeout`
    pub async fn is_closed_within(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.socket.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
