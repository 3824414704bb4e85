//! HTTP request handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::authn::handoff::AuthorizationCode;
use crate::authn::oauth::consent_url;
use crate::errors::ExporterError;
use crate::server::state::ServerState;

/// Path the provider redirects back to after consent
pub const AUTHORIZED_PATH: &str = "/authorized";

fn server_error(message: impl Into<String>) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message.into()).into_response()
}

/// Callback URI on this server, as seen by the browser
fn redirect_uri(headers: &HeaderMap) -> Result<String, ExporterError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ExporterError::ServerError("request has no Host header".to_string()))?;

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|proto| *proto == "https" || *proto == "http")
        .unwrap_or("http");

    Ok(format!("{}://{}{}", scheme, host, AUTHORIZED_PATH))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "sdm-exporter".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Redirect to the partner connection consent page
pub async fn authorize_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Response {
    let url = redirect_uri(&headers)
        .and_then(|uri| consent_url(&state.project_id, &state.client_id, &uri));

    match url {
        Ok(url) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, url.to_string())],
        )
            .into_response(),
        Err(e) => server_error(e.to_string()),
    }
}

/// Consent callback: hand the code to the coordinator
pub async fn authorized_handler(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let code = query.get("code").map(|code| code.trim()).unwrap_or_default();
    if code.is_empty() {
        return server_error(format!(
            "no authorization code received from partner connection manager: {}",
            uri
        ));
    }

    let redirect_uri = match redirect_uri(&headers) {
        Ok(uri) => uri,
        Err(e) => return server_error(e.to_string()),
    };

    let submission = state
        .authorizations
        .submit(AuthorizationCode {
            code: code.to_string(),
            redirect_uri,
        })
        .await;

    match submission {
        Ok(()) => {
            info!("Authorization code handed to the coordinator");
            "authorization code received from partner connection manager".into_response()
        }
        Err(e) => {
            error!("Unable to hand over authorization code: {}", e);
            server_error(e.to_string())
        }
    }
}

/// Plain text authorization status
pub async fn authstatus_handler(State(state): State<Arc<ServerState>>) -> &'static str {
    if state.readiness.is_ready() {
        "authorized"
    } else {
        "not authorized"
    }
}

/// Prometheus scrape endpoint
pub async fn metrics_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Unable to encode metrics: {}", e);
            server_error(e.to_string())
        }
    }
}
