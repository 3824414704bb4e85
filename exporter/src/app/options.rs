//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::sdm::client::SDM_API_BASE_URL;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Smart Device Management project ID
    pub project_id: String,

    /// OAuth2 client secret file
    pub credentials_file: PathBuf,

    /// Persisted OAuth2 token file
    pub token_file: PathBuf,

    /// Device API base URL
    pub api_base_url: String,

    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Poller worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            credentials_file: PathBuf::from("client_secret.json"),
            token_file: PathBuf::from("refresh_token.json"),
            api_base_url: SDM_API_BASE_URL.to_string(),
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            poller: poller::Options::default(),
        }
    }
}

/// Lifecycle options for the exporter
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address to bind to, `host:port`
    pub address: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
        }
    }
}
