//! Authorization coordinator
//!
//! Owns the token store and the write side of the client cell. At startup it
//! restores the client from the persisted token; afterwards every consumed
//! authorization code is exchanged, persisted and swapped in.

use std::sync::Arc;

use tracing::{info, warn};

use crate::authn::handoff::AuthorizationCode;
use crate::authn::oauth::OAuthProvider;
use crate::authn::token_store::TokenStore;
use crate::errors::ExporterError;
use crate::sdm::lifecycle::{ClientCell, ClientFactory, ClientLifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

pub struct Coordinator<F: ClientFactory> {
    store: TokenStore,
    oauth: Arc<dyn OAuthProvider>,
    lifecycle: ClientLifecycle<F>,
}

impl<F: ClientFactory> Coordinator<F> {
    pub fn new(store: TokenStore, oauth: Arc<dyn OAuthProvider>, factory: F) -> Self {
        Self {
            store,
            oauth,
            lifecycle: ClientLifecycle::new(factory),
        }
    }

    pub fn state(&self) -> AuthState {
        if self.lifecycle.is_ready() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Read handle on the live client
    pub fn client_cell(&self) -> Arc<ClientCell<F::Client>> {
        self.lifecycle.cell()
    }

    /// Restore the client from the persisted token, if there is one.
    ///
    /// A missing file leaves the coordinator unauthenticated. An unreadable
    /// or malformed file is fatal.
    pub async fn restore(&self) -> Result<AuthState, ExporterError> {
        let Some(token) = self.store.load().await? else {
            info!(
                "No token at {}, waiting for authorization",
                self.store.path().display()
            );
            return Ok(self.state());
        };

        if !token.has_refresh_token() {
            warn!(
                "Token at {} has no refresh token, waiting for a new authorization",
                self.store.path().display()
            );
            return Ok(self.state());
        }

        self.lifecycle.replace(token)?;
        info!("Client restored from {}", self.store.path().display());
        Ok(self.state())
    }

    /// Exchange `code`, persist the token and swap in a new client.
    ///
    /// Every failure is fatal; the live client is untouched on error.
    pub async fn authenticate(&self, code: &AuthorizationCode) -> Result<AuthState, ExporterError> {
        let token = self.oauth.exchange(code).await?;

        if !token.has_refresh_token() {
            return Err(ExporterError::TokenError(
                "no refresh token was provided by the api when authenticating".to_string(),
            ));
        }

        self.store.save(&token).await?;
        self.lifecycle.replace(token)?;

        info!("Authorization complete, client replaced");
        Ok(self.state())
    }
}
