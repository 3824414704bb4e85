//! Authorization coordinator worker

use std::future::Future;
use std::pin::Pin;

use tracing::{error, info};

use crate::authn::coordinator::Coordinator;
use crate::authn::handoff::AuthorizationReceiver;
use crate::errors::ExporterError;
use crate::sdm::lifecycle::ClientFactory;

/// Run the coordinator until shutdown.
///
/// Returns an error on any fatal authorization failure. The caller is
/// expected to bring the process down.
pub async fn run<F: ClientFactory>(
    coordinator: &Coordinator<F>,
    receiver: &mut AuthorizationReceiver,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Result<(), ExporterError> {
    info!("Authorization coordinator starting...");

    let state = coordinator.restore().await.inspect_err(|e| {
        error!("Unable to restore client from persisted token: {}", e);
    })?;
    info!("Authorization state: {:?}", state);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Authorization coordinator shutting down...");
                return Ok(());
            }
            code = receiver.recv() => {
                let Some(code) = code else {
                    info!("Authorization handoff closed, coordinator stopping...");
                    return Ok(());
                };

                info!("Authorization code received");
                coordinator.authenticate(&code).await.inspect_err(|e| {
                    error!("Authorization failed: {}", e);
                })?;
            }
        }
    }
}
