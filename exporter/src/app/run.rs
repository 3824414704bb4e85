//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::authn::handoff::AuthorizationReceiver;
use crate::errors::ExporterError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::{coordinator, poller};

/// Run the exporter until a shutdown signal or a fatal authorization error
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ExporterError> {
    info!("Initializing SDM exporter...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start exporter: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    let result = tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
            Ok(())
        }
        result = shutdown_manager.coordinator_exit() => {
            match &result {
                Ok(()) => info!("Authorization coordinator stopped, shutting down..."),
                Err(e) => error!("Authorization coordinator failed: {}", e),
            }
            result
        }
    };

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await?;
    result
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, ExporterError> {
    let (app_state, receiver) = AppState::init(options).await?;
    let app_state = Arc::new(app_state);

    init_coordinator_worker(
        app_state.clone(),
        receiver,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_poller_worker(
        options.poller.clone(),
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_server(
        options,
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await?;

    Ok(app_state)
}

fn init_coordinator_worker(
    app_state: Arc<AppState>,
    mut receiver: AuthorizationReceiver,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ExporterError> {
    info!("Initializing authorization coordinator...");

    let coordinator = app_state.coordinator.clone();

    let coordinator_handle = tokio::spawn(async move {
        coordinator::run(
            coordinator.as_ref(),
            &mut receiver,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await
    });

    shutdown_manager.with_coordinator_handle(coordinator_handle)
}

fn init_poller_worker(
    options: poller::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ExporterError> {
    info!("Initializing poller worker...");

    let poller = app_state.poller();

    let poller_handle = tokio::spawn(async move {
        poller::run(
            &options,
            &poller,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_poller_worker_handle(poller_handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ExporterError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(
        app_state.project_id.clone(),
        app_state.client_id.clone(),
        app_state.client_cell.clone(),
        app_state.authorizations.clone(),
        app_state.metrics.clone(),
    );

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    coordinator_handle: Option<JoinHandle<Result<(), ExporterError>>>,
    poller_worker_handle: Option<JoinHandle<()>>,
    server_handle: Option<JoinHandle<Result<(), ExporterError>>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            coordinator_handle: None,
            poller_worker_handle: None,
            server_handle: None,
        }
    }

    pub fn with_coordinator_handle(
        &mut self,
        handle: JoinHandle<Result<(), ExporterError>>,
    ) -> Result<(), ExporterError> {
        if self.coordinator_handle.is_some() {
            return Err(ExporterError::ShutdownError("coordinator_handle already set".to_string()));
        }
        self.coordinator_handle = Some(handle);
        Ok(())
    }

    pub fn with_poller_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ExporterError> {
        if self.poller_worker_handle.is_some() {
            return Err(ExporterError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), ExporterError>>,
    ) -> Result<(), ExporterError> {
        if self.server_handle.is_some() {
            return Err(ExporterError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    /// Resolves when the coordinator task ends; pending if there is none
    pub async fn coordinator_exit(&mut self) -> Result<(), ExporterError> {
        let Some(handle) = self.coordinator_handle.as_mut() else {
            return std::future::pending().await;
        };

        let result = handle.await;
        self.coordinator_handle = None;
        result.map_err(|e| ExporterError::ShutdownError(e.to_string()))?
    }

    pub async fn shutdown(&mut self) -> Result<(), ExporterError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ExporterError> {
        info!("Shutting down SDM exporter...");

        // 1. Coordinator
        if let Some(handle) = self.coordinator_handle.take() {
            // Its error, if any, has already been reported by run()
            if let Err(e) = handle.await.map_err(|e| ExporterError::ShutdownError(e.to_string()))? {
                error!("Authorization coordinator exited with error: {}", e);
            }
        }

        // 2. Poller worker
        if let Some(handle) = self.poller_worker_handle.take() {
            handle.await.map_err(|e| ExporterError::ShutdownError(e.to_string()))?;
        }

        // 3. HTTP server
        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| ExporterError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
