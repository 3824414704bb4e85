//! Current API client handle
//!
//! The coordinator is the only writer; the poller and the HTTP layer only
//! read. Replacement is a single atomic swap so a reader sees either the old
//! client or the new one, never an empty slot in between.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::authn::token::OAuth2Token;
use crate::errors::ExporterError;

/// Builds a client handle from a token
pub trait ClientFactory: Send + Sync {
    type Client: Send + Sync + 'static;

    /// Bind a client to `token`. Validates locally, never calls the API.
    fn connect(&self, token: OAuth2Token) -> Result<Self::Client, ExporterError>;
}

/// Whether an authenticated client is available
pub trait Readiness: Send + Sync {
    fn is_ready(&self) -> bool;
}

/// Atomic cell holding the live client, if any
pub struct ClientCell<C> {
    current: ArcSwapOption<C>,
}

impl<C> ClientCell<C> {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Snapshot of the live client
    pub fn current(&self) -> Option<Arc<C>> {
        self.current.load_full()
    }

    fn store(&self, client: Arc<C>) {
        self.current.store(Some(client));
    }
}

impl<C> Default for ClientCell<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync> Readiness for ClientCell<C> {
    fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }
}

/// Write side of the client cell, owned by the coordinator
pub struct ClientLifecycle<F: ClientFactory> {
    factory: F,
    cell: Arc<ClientCell<F::Client>>,
}

impl<F: ClientFactory> ClientLifecycle<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            cell: Arc::new(ClientCell::new()),
        }
    }

    /// Shared read handle for the poller and the HTTP layer
    pub fn cell(&self) -> Arc<ClientCell<F::Client>> {
        self.cell.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.cell.is_ready()
    }

    /// Build a client from `token` and make it the live one.
    ///
    /// On error the previous client, if any, stays in place.
    pub fn replace(&self, token: OAuth2Token) -> Result<Arc<F::Client>, ExporterError> {
        let client = Arc::new(self.factory.connect(token)?);
        self.cell.store(client.clone());
        Ok(client)
    }
}
