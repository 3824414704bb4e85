//! Authorization coordinator tests

use std::sync::Arc;

use async_trait::async_trait;
use sdm_exporter::authn::coordinator::{AuthState, Coordinator};
use sdm_exporter::authn::handoff::{self, AuthorizationCode};
use sdm_exporter::authn::oauth::OAuthProvider;
use sdm_exporter::authn::token::OAuth2Token;
use sdm_exporter::authn::token_store::TokenStore;
use sdm_exporter::errors::ExporterError;
use sdm_exporter::sdm::lifecycle::ClientFactory;
use sdm_exporter::workers::coordinator;
use tempfile::TempDir;

/// Hands back a fixed token, or fails when there is none
struct FakeOAuth {
    token: Option<OAuth2Token>,
}

#[async_trait]
impl OAuthProvider for FakeOAuth {
    async fn exchange(&self, code: &AuthorizationCode) -> Result<OAuth2Token, ExporterError> {
        self.token
            .clone()
            .ok_or_else(|| ExporterError::AuthError(format!("invalid_grant: {}", code.code)))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<OAuth2Token, ExporterError> {
        Err(ExporterError::AuthError("not supported".to_string()))
    }
}

/// The "client" is the access token it was built from
struct TokenClientFactory;

impl ClientFactory for TokenClientFactory {
    type Client = String;

    fn connect(&self, token: OAuth2Token) -> Result<String, ExporterError> {
        Ok(token.access_token)
    }
}

fn token(access: &str, refresh: &str) -> OAuth2Token {
    OAuth2Token {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: refresh.to_string(),
        expiry: None,
    }
}

fn code(value: &str) -> AuthorizationCode {
    AuthorizationCode {
        code: value.to_string(),
        redirect_uri: "http://localhost:8080/authorized".to_string(),
    }
}

fn coordinator_in(
    dir: &TempDir,
    exchanged: Option<OAuth2Token>,
) -> Coordinator<TokenClientFactory> {
    Coordinator::new(
        TokenStore::new(dir.path().join("refresh_token.json")),
        Arc::new(FakeOAuth { token: exchanged }),
        TokenClientFactory,
    )
}

#[tokio::test]
async fn test_restore_without_token_file() {
    let dir = TempDir::new().unwrap();
    let coordinator = coordinator_in(&dir, None);

    let state = coordinator.restore().await.unwrap();
    assert_eq!(state, AuthState::Unauthenticated);
    assert!(coordinator.client_cell().current().is_none());
}

#[tokio::test]
async fn test_restore_from_persisted_token() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::new(dir.path().join("refresh_token.json"));
    store.save(&token("persisted", "refresh")).await.unwrap();

    let coordinator = coordinator_in(&dir, None);
    let state = coordinator.restore().await.unwrap();

    assert_eq!(state, AuthState::Authenticated);
    assert_eq!(coordinator.client_cell().current().unwrap().as_str(), "persisted");
}

#[tokio::test]
async fn test_restore_from_corrupt_token_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("refresh_token.json"), "{not json").unwrap();

    let coordinator = coordinator_in(&dir, None);
    let result = coordinator.restore().await;

    assert!(matches!(result, Err(ExporterError::TokenError(_))));
    assert!(coordinator.client_cell().current().is_none());
}

#[tokio::test]
async fn test_restore_ignores_token_without_refresh_token() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::new(dir.path().join("refresh_token.json"));
    store.save(&token("access", "")).await.unwrap();

    let coordinator = coordinator_in(&dir, None);
    let state = coordinator.restore().await.unwrap();

    assert_eq!(state, AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_authenticate_persists_token_and_replaces_client() {
    let dir = TempDir::new().unwrap();
    let coordinator = coordinator_in(&dir, Some(token("fresh", "refresh")));
    let cell = coordinator.client_cell();

    let state = coordinator.authenticate(&code("abc")).await.unwrap();
    assert_eq!(state, AuthState::Authenticated);
    assert_eq!(cell.current().unwrap().as_str(), "fresh");

    let store = TokenStore::new(dir.path().join("refresh_token.json"));
    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.access_token, "fresh");
    assert_eq!(saved.refresh_token, "refresh");
}

#[tokio::test]
async fn test_authenticate_rejects_token_without_refresh_token() {
    let dir = TempDir::new().unwrap();
    let coordinator = coordinator_in(&dir, Some(token("fresh", "")));

    let result = coordinator.authenticate(&code("abc")).await;
    match result {
        Err(ExporterError::TokenError(message)) => {
            assert!(message.contains("no refresh token"));
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    assert!(coordinator.client_cell().current().is_none());
    assert!(!dir.path().join("refresh_token.json").exists());
}

#[tokio::test]
async fn test_token_without_refresh_keeps_previous_client() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::new(dir.path().join("refresh_token.json"));
    store.save(&token("persisted", "refresh")).await.unwrap();
    let before = std::fs::read_to_string(store.path()).unwrap();

    let coordinator = coordinator_in(&dir, Some(token("fresh", "")));
    assert_eq!(coordinator.restore().await.unwrap(), AuthState::Authenticated);

    let result = coordinator.authenticate(&code("abc")).await;
    assert!(matches!(result, Err(ExporterError::TokenError(_))));

    assert_eq!(coordinator.state(), AuthState::Authenticated);
    assert_eq!(coordinator.client_cell().current().unwrap().as_str(), "persisted");
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[tokio::test]
async fn test_failed_authentication_keeps_previous_client() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::new(dir.path().join("refresh_token.json"));
    store.save(&token("persisted", "refresh")).await.unwrap();

    let coordinator = coordinator_in(&dir, None);
    coordinator.restore().await.unwrap();

    assert!(coordinator.authenticate(&code("bad")).await.is_err());
    assert_eq!(coordinator.client_cell().current().unwrap().as_str(), "persisted");

    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.access_token, "persisted");
}

#[tokio::test]
async fn test_worker_stops_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let coordinator = coordinator_in(&dir, None);
    let (_sender, mut receiver) = handoff::channel();

    let result = coordinator::run(&coordinator, &mut receiver, Box::pin(async {})).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_worker_authenticates_submitted_code() {
    let dir = TempDir::new().unwrap();
    let coordinator = Arc::new(coordinator_in(&dir, Some(token("fresh", "refresh"))));
    let cell = coordinator.client_cell();
    let (sender, mut receiver) = handoff::channel();

    let worker = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator::run(
                coordinator.as_ref(),
                &mut receiver,
                Box::pin(std::future::pending::<()>()),
            )
            .await
        })
    };

    sender.submit(code("abc")).await.unwrap();

    // Closing the handoff lets the worker finish the pending authentication and stop
    drop(sender);
    worker.await.unwrap().unwrap();

    assert_eq!(cell.current().unwrap().as_str(), "fresh");
    assert!(dir.path().join("refresh_token.json").exists());
}

#[tokio::test]
async fn test_worker_fails_on_exchange_error() {
    let dir = TempDir::new().unwrap();
    let coordinator = Arc::new(coordinator_in(&dir, None));
    let (sender, mut receiver) = handoff::channel();

    let worker = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator::run(
                coordinator.as_ref(),
                &mut receiver,
                Box::pin(std::future::pending::<()>()),
            )
            .await
        })
    };

    sender.submit(code("bad")).await.unwrap();

    let result = worker.await.unwrap();
    assert!(matches!(result, Err(ExporterError::AuthError(_))));
}

#[tokio::test]
async fn test_worker_fails_on_corrupt_token_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("refresh_token.json"), "[]").unwrap();

    let coordinator = coordinator_in(&dir, None);
    let (_sender, mut receiver) = handoff::channel();

    let result = coordinator::run(
        &coordinator,
        &mut receiver,
        Box::pin(std::future::pending::<()>()),
    )
    .await;
    assert!(matches!(result, Err(ExporterError::TokenError(_))));
}
