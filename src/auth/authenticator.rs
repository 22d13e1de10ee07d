//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing token refresh.

use super::types::{AuthConfig, CachedToken};
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Diagnostic returned by the connection check for a malformed static token
pub const NON_ALPHANUMERIC_TOKEN: &str = "Server token should be alphanumeric.";

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached OAuth2 token; starts expired
    cached_token: Mutex<CachedToken>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        let initial = match &config {
            AuthConfig::Bearer { token } => CachedToken::new(token.clone(), None),
            AuthConfig::Oauth2ClientCredentials { .. } => CachedToken::expired(),
        };

        Self {
            config,
            cached_token: Mutex::new(initial),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(req.bearer_auth(token))
    }

    /// Current access token, fetching a new one if the cached token expired
    pub async fn access_token(&self) -> Result<String> {
        let AuthConfig::Oauth2ClientCredentials {
            token_url,
            client_id,
            client_secret,
            scopes,
            expiry_margin_seconds,
        } = &self.config
        else {
            return Ok(self.cached_token.lock().await.token.clone());
        };

        let mut cached = self.cached_token.lock().await;
        if !cached.is_expired_at(Utc::now(), *expiry_margin_seconds) {
            return Ok(cached.token.clone());
        }

        let new_token = self
            .fetch_client_credentials(token_url, client_id, client_secret, scopes)
            .await?;
        let token_str = new_token.token.clone();
        *cached = new_token;

        Ok(token_str)
    }

    /// Validate that credentials are obtainable or well-formed.
    ///
    /// Static tokens must be alphanumeric; OAuth2 credentials must yield a token.
    pub async fn verify(&self) -> Result<()> {
        match &self.config {
            AuthConfig::Bearer { token } => {
                if is_alphanumeric_token(token) {
                    Ok(())
                } else {
                    Err(Error::invalid_value("token", NON_ALPHANUMERIC_TOKEN))
                }
            }
            AuthConfig::Oauth2ClientCredentials { .. } => self.access_token().await.map(|_| ()),
        }
    }

    /// Fetch OAuth2 token using client credentials flow
    async fn fetch_client_credentials(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        scopes: &[String],
    ) -> Result<CachedToken> {
        info!("Fetching access token from {token_url}");

        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", client_id.to_string()),
            ("client_secret", client_secret.to_string()),
        ];

        if !scopes.is_empty() {
            form.push(("scopes", scopes.join(" ")));
        }

        let response = self
            .http_client
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Invalid token response: {e}")))?;
        debug!(expires_in = ?token_response.expires_in, "Received access token");

        token_response.into_cached_token()
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("kind", &self.config.kind())
            .finish_non_exhaustive()
    }
}

/// True when the token is non-empty and every character is alphanumeric
pub fn is_alphanumeric_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphanumeric)
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> Result<CachedToken> {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => Ok(CachedToken::new(self.access_token, None)),
        }
    }
}
