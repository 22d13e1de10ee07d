//! Connector trait and the listing connector
//!
//! Defines the `Connector` trait (spec / check / discover / read) and
//! `ResoConnector`, which runs any resolved preset through the sync engine.

use crate::config::Catalog;
use crate::connectors::{ConnectorKind, ResolvedConfig};
use crate::engine::{Clock, MessageStream, SyncEngine};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::state::State;
use crate::types::{JsonValue, SyncMode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Connector Spec
// ============================================================================

/// Connector specification returned by spec()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Connector name
    pub name: String,

    /// Description
    pub description: String,

    /// JSON schema of the connector config
    pub connection_specification: JsonValue,

    /// Whether incremental sync is supported
    pub supports_incremental: bool,
}

impl ConnectorSpec {
    /// Specification of a built-in connector
    pub fn for_kind(kind: ConnectorKind) -> Self {
        let info = kind.info();
        Self {
            name: info.name.to_string(),
            description: info.description.to_string(),
            connection_specification: info.connection_specification(),
            supports_incremental: true,
        }
    }
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Core trait that all connectors implement
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the connector specification
    fn spec(&self) -> ConnectorSpec;

    /// Tests whether the credentials work. Never fails; problems are
    /// reported in the result.
    async fn check(&self) -> CheckResult;

    /// Lists available streams from the source
    async fn discover(&self) -> Result<Catalog>;

    /// Reads the listing stream.
    ///
    /// Returns a lazy stream of records followed by a checkpoint.
    async fn read(&self, sync_mode: SyncMode, state: Option<&State>) -> Result<MessageStream>;
}

// ============================================================================
// RESO Connector
// ============================================================================

/// Listing connector driven by a resolved preset
pub struct ResoConnector {
    config: ResolvedConfig,
    client: Arc<HttpClient>,
    clock: Option<Clock>,
}

impl ResoConnector {
    /// Create a connector; builds the authenticated HTTP client
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let client_config = config.http.client_config(&config.stream);
        let client = HttpClient::with_auth(client_config, config.auth.clone())?;

        Ok(Self {
            config,
            client: Arc::new(client),
            clock: None,
        })
    }

    /// Resolve a user config for `kind` and create the connector
    pub fn from_value(kind: ConnectorKind, config: JsonValue) -> Result<Self> {
        Self::new(kind.resolve(config)?)
    }

    /// Replace the wall clock used for first checkpoints
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The resolved config
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }
}

impl std::fmt::Debug for ResoConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResoConnector")
            .field("kind", &self.config.kind)
            .field("stream", &self.config.stream.name)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for ResoConnector {
    fn spec(&self) -> ConnectorSpec {
        ConnectorSpec::for_kind(self.config.kind)
    }

    async fn check(&self) -> CheckResult {
        let Some(auth) = self.client.authenticator() else {
            return CheckResult::success();
        };

        match auth.verify().await {
            Ok(()) => {
                info!(connector = %self.config.kind, "Connection check succeeded");
                CheckResult::success()
            }
            Err(Error::InvalidConfigValue { message, .. }) => {
                warn!(connector = %self.config.kind, %message, "Connection check failed");
                CheckResult::failure(message)
            }
            Err(e) => {
                warn!(connector = %self.config.kind, error = %e, "Connection check failed");
                CheckResult::failure(e.to_string())
            }
        }
    }

    async fn discover(&self) -> Result<Catalog> {
        Ok(Catalog {
            streams: vec![self.config.stream.catalog_stream()],
        })
    }

    async fn read(&self, sync_mode: SyncMode, state: Option<&State>) -> Result<MessageStream> {
        let stream = &self.config.stream;
        let stream_state = match sync_mode {
            SyncMode::Incremental => state
                .and_then(|s| s.get_stream(&stream.name))
                .cloned(),
            SyncMode::FullRefresh => None,
        };

        let mut engine = SyncEngine::new(Arc::clone(&self.client), stream, stream_state);
        if let Some(clock) = &self.clock {
            engine = engine.with_clock(Arc::clone(clock));
        }

        Ok(engine.read())
    }
}
