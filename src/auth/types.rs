//! Auth configuration types
//!
//! These types describe how a connector obtains the bearer credential it
//! attaches to every listing request.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Static bearer token (server token / access token)
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 Client Credentials flow
    Oauth2ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Requested scopes
        #[serde(default)]
        scopes: Vec<String>,
        /// Refresh this many seconds before the token actually expires
        #[serde(default)]
        expiry_margin_seconds: i64,
    },
}

impl AuthConfig {
    /// Static bearer token auth
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Client credentials auth with no scopes and no refresh margin
    pub fn client_credentials(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::Oauth2ClientCredentials {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: Vec::new(),
            expiry_margin_seconds: 0,
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Oauth2ClientCredentials { .. } => "oauth2_client_credentials",
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// An empty token that is already expired, forcing a fetch on first use
    pub fn expired() -> Self {
        Self {
            token: String::new(),
            expires_at: Some(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Result<Self> {
        let expires_at = TimeDelta::try_seconds(seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| Error::auth("Invalid token response: expires_in out of range"))?;
        Ok(Self {
            token,
            expires_at: Some(expires_at),
        })
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now(), 0)
    }

    /// Expired when `now` is past the expiry minus `margin_seconds`.
    ///
    /// A margin too large to represent makes the token count as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => TimeDelta::try_seconds(margin_seconds)
                .and_then(|margin| expires_at.checked_sub_signed(margin))
                .map_or(true, |deadline| now > deadline),
            None => false, // No expiration = never expires
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_cached_token_not_expired() {
        let token = CachedToken::expires_in("test".to_string(), 3600).unwrap();
        assert!(!token.is_expired());
    }

    #[test]
    fn test_cached_token_expired() {
        let token = CachedToken::expires_in("test".to_string(), -100).unwrap();
        assert!(token.is_expired());
    }

    #[test]
    fn test_initial_token_is_expired() {
        assert!(CachedToken::expired().is_expired());
    }

    #[test]
    fn test_cached_token_no_expiration() {
        let token = CachedToken::new("test".to_string(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expiry_margin() {
        let token = CachedToken::expires_in("test".to_string(), 5).unwrap();
        assert!(!token.is_expired_at(Utc::now(), 0));
        assert!(token.is_expired_at(Utc::now(), 10));
    }

    #[test]
    fn test_expiry_out_of_range() {
        let err = CachedToken::expires_in("test".to_string(), i64::MAX).unwrap_err();
        assert!(err.is_auth());

        let token = CachedToken::expires_in("test".to_string(), 3600).unwrap();
        assert!(token.is_expired_at(Utc::now(), i64::MAX));
        assert!(token.is_expired_at(Utc::now(), i64::MIN));
    }

    #[test]
    fn test_auth_config_deserialize() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "type": "oauth2_client_credentials",
            "token_url": "https://auth.example.com/token",
            "client_id": "id",
            "client_secret": "secret"
        }))
        .unwrap();
        assert_eq!(
            config,
            AuthConfig::client_credentials("https://auth.example.com/token", "id", "secret")
        );
        assert_eq!(config.kind(), "oauth2_client_credentials");
    }
}
