//! OAuth2 client for the Google authorization server

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use crate::authn::handoff::AuthorizationCode;
use crate::authn::token::OAuth2Token;
use crate::errors::ExporterError;
use crate::filesys::file::File;

/// Scope granting access to the Smart Device Management API
pub const SDM_SCOPE: &str = "https://www.googleapis.com/auth/sdm.service";

const PARTNER_CONNECTIONS_URL: &str = "https://nestservices.google.com/partnerconnections";

/// OAuth2 client credentials from a Google client secret file
#[derive(Debug, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,

    pub client_secret: SecretString,

    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Google wraps the credentials in an application-type key
#[derive(Deserialize)]
struct CredentialsFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

impl ClientCredentials {
    /// Parse a client secret JSON document
    pub fn from_json(raw: &str) -> Result<Self, ExporterError> {
        let file: CredentialsFile = serde_json::from_str(raw)?;
        let credentials = file.web.or(file.installed).ok_or_else(|| {
            ExporterError::ConfigError(
                "credentials file has neither an \"installed\" nor a \"web\" section".to_string(),
            )
        })?;

        if credentials.client_id.trim().is_empty() {
            return Err(ExporterError::ConfigError(
                "credentials file has an empty client_id".to_string(),
            ));
        }

        Ok(credentials)
    }

    /// Load the client secret file from disk
    pub async fn load(file: &File) -> Result<Self, ExporterError> {
        let raw = file.read_string().await.map_err(|e| {
            ExporterError::ConfigError(format!(
                "unable to read credentials file {}: {}",
                file.path().display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }
}

/// Token operations against the OAuth provider
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Exchange an authorization code for a token
    async fn exchange(&self, code: &AuthorizationCode) -> Result<OAuth2Token, ExporterError>;

    /// Obtain a fresh access token from a refresh credential
    async fn refresh(&self, refresh_token: &str) -> Result<OAuth2Token, ExporterError>;
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self) -> OAuth2Token {
        OAuth2Token {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_default(),
            refresh_token: self.refresh_token.unwrap_or_default(),
            expiry: self
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        }
    }
}

/// HTTP client for the OAuth token endpoint
#[derive(Clone)]
pub struct OAuthClient {
    client: Client,
    credentials: Arc<ClientCredentials>,
}

impl OAuthClient {
    /// Create a new OAuth client
    pub fn new(credentials: ClientCredentials) -> Result<Self, ExporterError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            credentials: Arc::new(credentials),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    /// Partner connection consent page for `project_id`
    pub fn consent_url(&self, project_id: &str, redirect_uri: &str) -> Result<Url, ExporterError> {
        consent_url(project_id, self.client_id(), redirect_uri)
    }

    /// POST to the token endpoint. The client credentials travel in the form
    /// body, as Google's endpoint expects.
    async fn request_token(&self, grant: &[(&str, &str)]) -> Result<TokenResponse, ExporterError> {
        let url = &self.credentials.token_uri;
        debug!("POST {} ({})", url, grant[0].1);

        let mut form = grant.to_vec();
        form.push(("client_id", self.credentials.client_id.as_str()));
        form.push(("client_secret", self.credentials.client_secret.expose_secret()));

        let response = self.client.post(url).form(&form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token request failed: {} - {}", status, body);
            return Err(ExporterError::AuthError(format!(
                "token request failed: {} - {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl OAuthProvider for OAuthClient {
    async fn exchange(&self, code: &AuthorizationCode) -> Result<OAuth2Token, ExporterError> {
        info!("Exchanging authorization code for a token...");

        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", &code.code),
                ("redirect_uri", &code.redirect_uri),
            ])
            .await?;

        Ok(response.into_token())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<OAuth2Token, ExporterError> {
        debug!("Refreshing access token...");

        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        let mut token = response.into_token();
        // Google does not rotate refresh tokens on refresh
        if !token.has_refresh_token() {
            token.refresh_token = refresh_token.to_string();
        }
        Ok(token)
    }
}

/// Build the partner connection consent URL
pub fn consent_url(
    project_id: &str,
    client_id: &str,
    redirect_uri: &str,
) -> Result<Url, ExporterError> {
    let base = format!("{}/{}/auth", PARTNER_CONNECTIONS_URL, project_id);
    let url = Url::parse_with_params(
        &base,
        &[
            ("access_type", "offline"),
            ("client_id", client_id),
            ("prompt", "consent"),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", SDM_SCOPE),
        ],
    )?;
    Ok(url)
}
