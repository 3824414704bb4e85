//! Server state

use std::sync::Arc;

use crate::authn::handoff::AuthorizationSender;
use crate::sdm::lifecycle::Readiness;
use crate::telemetry::metrics::Metrics;

/// Server state shared across handlers
pub struct ServerState {
    pub project_id: String,
    pub client_id: String,
    pub readiness: Arc<dyn Readiness>,
    pub authorizations: AuthorizationSender,
    pub metrics: Arc<Metrics>,
}

impl ServerState {
    pub fn new(
        project_id: String,
        client_id: String,
        readiness: Arc<dyn Readiness>,
        authorizations: AuthorizationSender,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            project_id,
            client_id,
            readiness,
            authorizations,
            metrics,
        }
    }
}
