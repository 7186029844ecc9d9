//! OAuth user-token storage and refresh.
//!
//! The token file is the authorized-user JSON shape produced by a one-time
//! interactive consent flow: access token, refresh token, and the client
//! pair needed to mint new access tokens. This module reads it, refreshes
//! the access token when expired, and writes it back atomically.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Google's OAuth 2.0 token endpoint.
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// An authorized-user token set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    /// The current access token.
    #[serde(rename = "token")]
    pub access_token: String,

    /// The long-lived refresh token.
    pub refresh_token: Option<String>,

    /// OAuth client id, needed for refresh.
    pub client_id: Option<String>,

    /// OAuth client secret, needed for refresh.
    pub client_secret: Option<String>,

    /// Token endpoint override; defaults to Google's.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// Access-token expiry, RFC 3339.
    pub expiry: Option<String>,

    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

/// Successful refresh response body.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

impl UserToken {
    /// Loads a token file.
    pub fn load(path: &Path) -> ProviderResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!("cannot read token file {}", path.display()))
                .with_source(e)
        })?;
        let token: Self = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("cannot parse token file {}", path.display()))
                .with_source(e)
        })?;
        debug!(path = %path.display(), "token file loaded");
        Ok(token)
    }

    /// Saves the token file atomically with owner-only permissions.
    pub fn save(&self, path: &Path) -> ProviderResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!(
                    "cannot create token directory {}",
                    parent.display()
                ))
                .with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ProviderError::internal("cannot serialize token").with_source(e))?;

        // Temp file plus rename keeps a crash from truncating the file.
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration(format!("cannot write token file {}", path.display()))
                .with_source(e)
        })?;
        fs::rename(&temp_path, path).map_err(|e| {
            ProviderError::configuration(format!("cannot rename token file {}", path.display()))
                .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
        }

        debug!(path = %path.display(), "token file saved");
        Ok(())
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// An unparseable expiry counts as expired; an absent expiry as valid.
    pub fn is_expired(&self) -> bool {
        match &self.expiry {
            None => false,
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(expiry) => Utc::now() + Duration::seconds(60) >= expiry.with_timezone(&Utc),
                Err(_) => true,
            },
        }
    }

    /// Mints a new access token from the refresh token.
    pub async fn refresh(&mut self, http_client: &reqwest::Client) -> ProviderResult<()> {
        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or_else(|| ProviderError::authentication("no refresh token in token file"))?;
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| ProviderError::authentication("no client id in token file"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| ProviderError::authentication("no client secret in token file"))?;

        let response = http_client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::network("token refresh request failed").with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::authentication(format!(
                "token refresh rejected ({}): {}",
                status, body
            )));
        }

        let refreshed: RefreshResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response("cannot parse token refresh response").with_source(e)
        })?;

        self.access_token = refreshed.access_token;
        self.expiry = refreshed
            .expires_in
            .map(|secs| (Utc::now() + Duration::seconds(secs)).to_rfc3339());

        info!("access token refreshed");
        Ok(())
    }
}
