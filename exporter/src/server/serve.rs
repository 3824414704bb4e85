//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::ExporterError;
use crate::server::handlers::{
    authorize_handler, authorized_handler, authstatus_handler, health_handler, metrics_handler,
    AUTHORIZED_PATH,
};
use crate::server::state::ServerState;

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Authorization
        .route("/authorize", get(authorize_handler))
        .route(AUTHORIZED_PATH, get(authorized_handler))
        .route("/authstatus", get(authstatus_handler))
        // Metrics
        .route("/metrics", get(metrics_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ExporterError>>, ExporterError> {
    let app = router(state);

    info!("Starting HTTP server on {}", options.address);

    let listener = TcpListener::bind(&options.address)
        .await
        .map_err(|e| ExporterError::ServerError(format!("{}: {}", options.address, e)))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ExporterError::ServerError(e.to_string()))
    });

    Ok(handle)
}
