//! Smart Device Management API client

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::authn::oauth::OAuthProvider;
use crate::authn::token::OAuth2Token;
use crate::errors::ExporterError;
use crate::sdm::lifecycle::ClientFactory;
use crate::sdm::models::{Device, ListDevicesResponse};

/// Production API endpoint
pub const SDM_API_BASE_URL: &str = "https://smartdevicemanagement.googleapis.com";

/// Read access to the device API
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// List every device of the project, following pagination to the end
    async fn list_devices(&self, project_id: &str) -> Result<Vec<Device>, ExporterError>;
}

/// Resource name of a project
pub fn enterprise(project_id: &str) -> String {
    format!("enterprises/{}", project_id)
}

/// Authenticated client for the SDM API.
///
/// Holds the token it was built from and renews the access token through the
/// OAuth provider whenever it has expired. Renewed tokens live in memory only.
pub struct SdmClient {
    client: Client,
    base_url: String,
    token: Mutex<OAuth2Token>,
    oauth: Arc<dyn OAuthProvider>,
}

impl SdmClient {
    /// Create a client bound to `token`.
    ///
    /// Only the token shape is checked; nothing is sent to the API.
    pub fn new(
        client: Client,
        base_url: &str,
        token: OAuth2Token,
        oauth: Arc<dyn OAuthProvider>,
    ) -> Result<Self, ExporterError> {
        if token.access_token.trim().is_empty() && !token.has_refresh_token() {
            return Err(ExporterError::AuthError(
                "token has neither an access token nor a refresh token".to_string(),
            ));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(token),
            oauth,
        })
    }

    /// Authorization header value, refreshing the access token if needed
    async fn authorization(&self) -> Result<String, ExporterError> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            if !token.has_refresh_token() {
                return Err(ExporterError::TokenError(
                    "access token expired and no refresh token is available".to_string(),
                ));
            }
            let refreshed = self.oauth.refresh(&token.refresh_token).await?;
            debug!("Access token refreshed, expires at {:?}", refreshed.expiry);
            *token = refreshed;
        }

        Ok(format!("{} {}", token.auth_scheme(), token.access_token))
    }

    async fn list_devices_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ListDevicesResponse, ExporterError> {
        let url = format!("{}/v1/{}/devices", self.base_url, parent);
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.authorization().await?);

        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(ExporterError::ApiError(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DeviceApi for SdmClient {
    async fn list_devices(&self, project_id: &str) -> Result<Vec<Device>, ExporterError> {
        let parent = enterprise(project_id);
        let mut devices = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_devices_page(&parent, page_token.as_deref()).await?;

            for raw in page.devices {
                match serde_json::from_value::<Device>(raw) {
                    Ok(device) => devices.push(device),
                    Err(e) => warn!("Skipping malformed device record: {}", e),
                }
            }

            match page.next_page_token {
                Some(next) if !next.is_empty() => {
                    if !seen_tokens.insert(next.clone()) {
                        return Err(ExporterError::ApiError(format!(
                            "device listing repeated page token {:?}",
                            next
                        )));
                    }
                    page_token = Some(next);
                }
                _ => break,
            }
        }

        Ok(devices)
    }
}

/// Builds [`SdmClient`]s sharing one connection pool
pub struct SdmClientFactory {
    client: Client,
    base_url: String,
    oauth: Arc<dyn OAuthProvider>,
}

impl SdmClientFactory {
    pub fn new(base_url: &str, oauth: Arc<dyn OAuthProvider>) -> Result<Self, ExporterError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            oauth,
        })
    }
}

impl ClientFactory for SdmClientFactory {
    type Client = SdmClient;

    fn connect(&self, token: OAuth2Token) -> Result<SdmClient, ExporterError> {
        SdmClient::new(
            self.client.clone(),
            &self.base_url,
            token,
            self.oauth.clone(),
        )
    }
}
