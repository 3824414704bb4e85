//! OAuth2 token representation

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access tokens count as expired this long before their real expiry
const EXPIRY_DELTA_SECS: i64 = 10;

/// An OAuth2 token as persisted on disk.
///
/// The field names follow the JSON encoding used by golang.org/x/oauth2 so
/// existing `refresh_token.json` files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// Short-lived bearer credential
    pub access_token: String,

    /// Token type, normally "Bearer"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,

    /// Long-lived credential used for unattended renewal
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,

    /// Expiration of the access token, if the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuth2Token {
    /// Whether the token carries a refresh credential
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }

    /// Whether the access token is missing or past its expiry
    pub fn is_expired(&self) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        match self.expiry {
            // golang writes the zero time for tokens that never expire
            Some(expiry) if expiry.timestamp() > 0 => {
                expiry - Duration::seconds(EXPIRY_DELTA_SECS) <= Utc::now()
            }
            _ => false,
        }
    }

    /// The token type to send in the Authorization header
    pub fn auth_scheme(&self) -> &str {
        if self.token_type.is_empty() || self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            &self.token_type
        }
    }
}
