//! Persisted OAuth2 token storage

use std::path::Path;

use tracing::debug;

use crate::authn::token::OAuth2Token;
use crate::errors::ExporterError;
use crate::filesys::file::File;

/// Reads and writes the OAuth2 token file.
///
/// The token is the only durable state of the exporter.
#[derive(Debug, Clone)]
pub struct TokenStore {
    file: File,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: File::new(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Load the persisted token.
    ///
    /// `Ok(None)` means no prior authorization. A file that exists but cannot
    /// be read or parsed is an error.
    pub async fn load(&self) -> Result<Option<OAuth2Token>, ExporterError> {
        let token = self.file.read_json_opt::<OAuth2Token>().await.map_err(|e| {
            ExporterError::TokenError(format!(
                "unable to load token file {}: {}",
                self.file.path().display(),
                e
            ))
        })?;

        if token.is_none() {
            debug!("No token file at {}", self.file.path().display());
        }

        Ok(token)
    }

    /// Overwrite the token file with `token`
    pub async fn save(&self, token: &OAuth2Token) -> Result<(), ExporterError> {
        self.file.write_json(token).await?;
        self.file.set_permissions_600().await?;
        debug!("Token saved to {}", self.file.path().display());
        Ok(())
    }
}
