//! SDM Exporter - Entry Point
//!
//! Serves thermostat readings from the Smart Device Management API as
//! Prometheus metrics.

use std::env;

use clap::Parser;
use sdm_exporter::app::run::run;
use sdm_exporter::config::{Args, Config};
use sdm_exporter::logs::init_logging;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments, then apply environment overrides
    let args = Args::parse();
    let config = match Config::resolve(args, |key| env::var(key).ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    if let Err(e) = init_logging(&config.logs) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Running SDM exporter with options: {:?}", config.app);
    if let Err(e) = run(config.app, await_shutdown_signal()).await {
        error!("Failed to run the exporter: {e}");
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Ctrl+C received, shutting down...");
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Ctrl+C received, shutting down...");
    }
}
