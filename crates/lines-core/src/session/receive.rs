//! Receive side of a session: reads client requests and hands validated
//! requirements to the push loop.

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{SessionError, SessionResult, TransportError};
use crate::models::SubscriptionRequest;
use crate::reconcile::Requirement;

pub(crate) struct ReceiveLoop {
    session_id: String,
    requirements: mpsc::Sender<Requirement>,
    finish: oneshot::Sender<()>,
    cancel: CancellationToken,
}

impl ReceiveLoop {
    pub(crate) fn new(
        session_id: String,
        requirements: mpsc::Sender<Requirement>,
        finish: oneshot::Sender<()>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            requirements,
            finish,
            cancel,
        }
    }

    pub(crate) async fn run<I>(self, mut incoming: I) -> SessionResult<()>
    where
        I: Stream<Item = Result<SubscriptionRequest, TransportError>> + Unpin,
    {
        let ReceiveLoop {
            session_id,
            requirements,
            finish,
            cancel,
        } = self;
        let mut finish = Some(finish);

        loop {
            if cancel.is_cancelled() {
                terminate(&mut finish);
                return Err(SessionError::Cancelled);
            }

            // The single slot frees up once the push loop took the previous
            // requirement, so no request is read before that.
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    terminate(&mut finish);
                    return Err(SessionError::Cancelled);
                }
                permit = requirements.reserve() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        debug!(%session_id, "Push loop finished, stop receiving");
                        return Ok(());
                    }
                },
            };

            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    terminate(&mut finish);
                    return Err(SessionError::Cancelled);
                }
                _ = requirements.closed() => {
                    debug!(%session_id, "Push loop finished, stop receiving");
                    return Ok(());
                }
                message = incoming.next() => message,
            };

            let request = match message {
                None => {
                    info!(%session_id, "Client closed subscription stream");
                    terminate(&mut finish);
                    return Ok(());
                }
                Some(Err(e)) => {
                    warn!(%session_id, error = %e, "Error occurred while receiving subscription request");
                    terminate(&mut finish);
                    return Err(SessionError::Receive(e));
                }
                Some(Ok(request)) => request,
            };

            if request.sports.is_empty() {
                warn!(%session_id, "Client requested zero length list of sports");
            }

            // A zero interval never reaches the push loop; our channel
            // endpoints are dropped on return, which stops it.
            let requirement = match Requirement::try_from(request) {
                Ok(requirement) => requirement,
                Err(e) => {
                    error!(%session_id, error = %e, "Rejecting subscription request");
                    return Err(e);
                }
            };

            debug!(
                %session_id,
                sports = ?requirement.sports,
                interval_secs = requirement.interval.as_secs(),
                "Requirement received"
            );
            permit.send(requirement);
        }
    }
}

/// Tell the push loop to stop. Safe to call more than once.
fn terminate(finish: &mut Option<oneshot::Sender<()>>) {
    if let Some(finish) = finish.take() {
        // Push loop may already be gone
        let _ = finish.send(());
    }
}
