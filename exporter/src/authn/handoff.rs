//! Authorization code handoff between the HTTP callback and the coordinator
//!
//! A single-slot rendezvous: `submit` returns only once the coordinator has
//! taken the code, and at most one code is ever in flight. Concurrent
//! submitters queue on the slot, which throttles duplicate consent clicks.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

use crate::errors::ExporterError;

/// An authorization code and the redirect URI it was issued against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
}

struct Delivery {
    code: AuthorizationCode,
    consumed: oneshot::Sender<()>,
}

/// Create a connected sender/receiver pair
pub fn channel() -> (AuthorizationSender, AuthorizationReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (
        AuthorizationSender {
            tx,
            slot: Arc::new(Mutex::new(())),
        },
        AuthorizationReceiver { rx },
    )
}

/// Producer side, held by the HTTP layer
#[derive(Clone)]
pub struct AuthorizationSender {
    tx: mpsc::Sender<Delivery>,
    slot: Arc<Mutex<()>>,
}

impl AuthorizationSender {
    /// Hand a code to the coordinator and wait until it has been consumed
    pub async fn submit(&self, code: AuthorizationCode) -> Result<(), ExporterError> {
        let _slot = self.slot.lock().await;

        let (consumed_tx, consumed_rx) = oneshot::channel();
        self.tx
            .send(Delivery {
                code,
                consumed: consumed_tx,
            })
            .await
            .map_err(|_| {
                ExporterError::HandoffError("authorization coordinator is not running".to_string())
            })?;

        consumed_rx.await.map_err(|_| {
            ExporterError::HandoffError(
                "authorization coordinator stopped before consuming the code".to_string(),
            )
        })
    }
}

/// Consumer side, owned by the coordinator
pub struct AuthorizationReceiver {
    rx: mpsc::Receiver<Delivery>,
}

impl AuthorizationReceiver {
    /// Wait for the next code. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<AuthorizationCode> {
        let delivery = self.rx.recv().await?;
        Some(Self::consume(delivery))
    }

    fn consume(delivery: Delivery) -> AuthorizationCode {
        // The submitter may have given up (client disconnected); the code is
        // still valid and gets used.
        if delivery.consumed.send(()).is_err() {
            debug!("Authorization code submitter went away before consumption");
        }
        delivery.code
    }
}
