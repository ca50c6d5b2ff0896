//! Per-connection subscription sessions
//!
//! A session is made of two loops that only talk through channels:
//!
//! ```text
//!  client ──requests──▶ ReceiveLoop ──Requirement (mpsc, 1 slot)──▶ PushLoop ──deltas──▶ client
//!                            │                                         ▲
//!                            └────────── finish (oneshot) ─────────────┘
//! ```
//!
//! - The receive loop validates requests and hands them over one at a time.
//!   It does not read the next request until the push loop took the previous one.
//! - The push loop owns the baseline and the timer, and performs every send.
//!
//! Either loop ending ends the session. Dropping the receive loop's channel
//! endpoints stops the push loop; the push loop dropping its receiver
//! unblocks the receive loop.

mod push;
mod receive;

use std::sync::Arc;

use futures::{Sink, Stream};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult, TransportError};
use crate::models::{SubscriptionRequest, SubscriptionResponse};
use crate::store::LineStore;

use push::PushLoop;
use receive::ReceiveLoop;

/// One client's subscription to sports lines
pub struct SubscriptionSession {
    id: String,
    store: Arc<dyn LineStore>,
}

impl SubscriptionSession {
    /// Create a session reading from `store`
    pub fn new(store: Arc<dyn LineStore>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            store,
        }
    }

    /// Session identifier used in logs
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the session until the client leaves, a fatal error occurs, or
    /// `cancel` fires.
    ///
    /// Returns `Ok(())` on a clean end of the request stream. Store failures
    /// during a push cycle are logged and never end the session.
    pub async fn run<I, O>(
        self,
        incoming: I,
        outgoing: O,
        cancel: CancellationToken,
    ) -> SessionResult<()>
    where
        I: Stream<Item = Result<SubscriptionRequest, TransportError>> + Unpin + Send,
        O: Sink<SubscriptionResponse, Error = TransportError> + Unpin + Send + 'static,
    {
        let (requirements_tx, requirements_rx) = mpsc::channel(1);
        let (finish_tx, finish_rx) = oneshot::channel();

        info!(session_id = %self.id, "Subscription session started");

        let push = PushLoop::new(
            self.id.clone(),
            self.store,
            outgoing,
            requirements_rx,
            finish_rx,
        );
        let push_handle = tokio::spawn(push.run());

        let received = ReceiveLoop::new(self.id.clone(), requirements_tx, finish_tx, cancel)
            .run(incoming)
            .await;

        // Receive loop has released both channel endpoints, so the push loop
        // is already on its way out.
        let pushed = match push_handle.await {
            Ok(result) => result,
            Err(e) => Err(SessionError::PushLoop(e.to_string())),
        };

        debug!(session_id = %self.id, "Subscription session finished");

        received.and(pushed)
    }
}
