//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::authn::coordinator::Coordinator;
use crate::authn::handoff::{self, AuthorizationReceiver, AuthorizationSender};
use crate::authn::oauth::{ClientCredentials, OAuthClient};
use crate::authn::token_store::TokenStore;
use crate::errors::ExporterError;
use crate::filesys::file::File;
use crate::sdm::client::{SdmClient, SdmClientFactory};
use crate::sdm::lifecycle::ClientCell;
use crate::telemetry::devices::DeviceRegistry;
use crate::telemetry::metrics::Metrics;
use crate::telemetry::poller::Poller;

/// Main application state
pub struct AppState {
    /// Project the devices belong to
    pub project_id: String,

    /// OAuth client ID, sent on the consent page
    pub client_id: String,

    /// Metric series
    pub metrics: Arc<Metrics>,

    /// Authorization coordinator
    pub coordinator: Arc<Coordinator<SdmClientFactory>>,

    /// Live API client
    pub client_cell: Arc<ClientCell<SdmClient>>,

    /// Producer side of the authorization handoff
    pub authorizations: AuthorizationSender,
}

impl AppState {
    /// Initialize application state.
    ///
    /// Returns the consumer side of the authorization handoff alongside the
    /// state; it belongs to the coordinator worker.
    pub async fn init(
        options: &AppOptions,
    ) -> Result<(Self, AuthorizationReceiver), ExporterError> {
        info!("Initializing application state...");

        let credentials = ClientCredentials::load(&File::new(&options.credentials_file)).await?;
        let oauth = OAuthClient::new(credentials)?;
        let client_id = oauth.client_id().to_string();
        let oauth = Arc::new(oauth);

        let factory = SdmClientFactory::new(&options.api_base_url, oauth.clone())?;
        let coordinator = Arc::new(Coordinator::new(
            TokenStore::new(&options.token_file),
            oauth,
            factory,
        ));
        let client_cell = coordinator.client_cell();

        let metrics = Arc::new(Metrics::new()?);
        let (authorizations, receiver) = handoff::channel();

        let state = Self {
            project_id: options.project_id.clone(),
            client_id,
            metrics,
            coordinator,
            client_cell,
            authorizations,
        };

        Ok((state, receiver))
    }

    /// Build the telemetry poller over the live client
    pub fn poller(&self) -> Poller<SdmClient> {
        Poller::new(
            self.project_id.clone(),
            self.client_cell.clone(),
            DeviceRegistry::default(),
            self.metrics.clone(),
        )
    }
}
