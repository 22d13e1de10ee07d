//! Configuration types
//!
//! `StreamConfig` fully describes one listing stream: where it lives, what is
//! requested, how pagination continues and how the cursor is read. Presets in
//! `connectors` produce a `StreamConfig` from a small user config; the
//! generic `odata` connector accepts one directly.

use crate::decode::{JsonDecoder, DEFAULT_RECORDS_KEY};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::incremental::{CursorFilter, CursorFormat, InitialCheckpoint, StateMerger};
use crate::pagination::{NextLinkPaginator, ODATA_NEXT_LINK};
use crate::state::StreamState;
use crate::types::{JsonValue, SyncMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Name of the single listing stream every connector exposes
pub const PROPERTIES_STREAM: &str = "properties";

// ============================================================================
// Stream Config
// ============================================================================

/// Complete description of a paginated, cursor-tracked listing stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream name
    #[serde(default = "default_stream_name")]
    pub name: String,

    /// Base URL the path is resolved against
    pub base_url: String,

    /// Listing path relative to `base_url`
    pub path: String,

    /// Fields requested with `$select`
    #[serde(default)]
    pub select: Vec<String>,

    /// `$filter` expression
    #[serde(default)]
    pub filter: Option<String>,

    /// `$top` page size
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Next-link query parameters that continue pagination
    #[serde(default = "default_continuation_keys")]
    pub continuation_keys: Vec<String>,

    /// Response field holding the next link
    #[serde(default = "default_next_link_field")]
    pub next_link_field: String,

    /// Response field holding the records
    #[serde(default = "default_records_key")]
    pub records_key: String,

    /// Record field holding the modification timestamp
    pub cursor_field: String,

    /// Key the checkpoint is stored under; defaults to `cursor_field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,

    /// Timestamp format of the cursor field
    #[serde(default)]
    pub cursor_format: CursorFormat,

    /// Checkpoint used when no prior state exists
    #[serde(default)]
    pub initial_checkpoint: InitialCheckpoint,

    /// Primary key fields
    #[serde(default = "default_primary_key")]
    pub primary_key: Vec<String>,

    /// Extra headers sent with every listing request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_stream_name() -> String {
    PROPERTIES_STREAM.to_string()
}

fn default_continuation_keys() -> Vec<String> {
    vec!["$skip".to_string()]
}

fn default_next_link_field() -> String {
    ODATA_NEXT_LINK.to_string()
}

fn default_records_key() -> String {
    DEFAULT_RECORDS_KEY.to_string()
}

fn default_primary_key() -> Vec<String> {
    vec!["ListingKey".to_string()]
}

impl StreamConfig {
    /// Create a stream with OData defaults
    pub fn new(
        base_url: impl Into<String>,
        path: impl Into<String>,
        cursor_field: impl Into<String>,
    ) -> Self {
        Self {
            name: default_stream_name(),
            base_url: base_url.into(),
            path: path.into(),
            select: Vec::new(),
            filter: None,
            page_size: None,
            continuation_keys: default_continuation_keys(),
            next_link_field: default_next_link_field(),
            records_key: default_records_key(),
            cursor_field: cursor_field.into(),
            state_key: None,
            cursor_format: CursorFormat::default(),
            initial_checkpoint: InitialCheckpoint::default(),
            primary_key: default_primary_key(),
            headers: BTreeMap::new(),
        }
    }

    /// Key the checkpoint is stored under
    pub fn state_key(&self) -> &str {
        self.state_key.as_deref().unwrap_or(&self.cursor_field)
    }

    /// Append selected fields, skipping ones already present
    pub fn add_select<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.select.contains(&field) {
                self.select.push(field);
            }
        }
    }

    /// Fixed query parameters sent with every page
    pub fn query_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if !self.select.is_empty() {
            params.insert("$select".to_string(), self.select.join(","));
        }
        if let Some(filter) = &self.filter {
            params.insert("$filter".to_string(), filter.clone());
        }
        if let Some(top) = self.page_size {
            params.insert("$top".to_string(), top.to_string());
        }
        params
    }

    /// Paginator following this stream's next link
    pub fn paginator(&self) -> NextLinkPaginator {
        NextLinkPaginator::new(&self.next_link_field, &self.continuation_keys)
    }

    /// Decoder reading this stream's records key
    pub fn decoder(&self) -> JsonDecoder {
        JsonDecoder::with_key(&self.records_key)
    }

    /// Filter against the stream's prior checkpoint
    pub fn cursor_filter(&self, state: Option<&StreamState>) -> CursorFilter {
        CursorFilter::from_state(&self.cursor_field, self.state_key(), state)
    }

    /// Merger producing this stream's checkpoints
    pub fn state_merger(&self) -> StateMerger {
        StateMerger::new(
            &self.cursor_field,
            self.state_key(),
            self.cursor_format.clone(),
            self.initial_checkpoint,
        )
    }

    /// Check the config is usable before any request is made
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

        if self.path.trim().is_empty() {
            return Err(Error::missing_field("path"));
        }
        if self.cursor_field.is_empty() {
            return Err(Error::missing_field("cursor_field"));
        }
        if self.continuation_keys.is_empty() {
            return Err(Error::missing_field("continuation_keys"));
        }
        if self.page_size == Some(0) {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }

        self.cursor_format.validate()
    }

    /// Catalog entry for this stream
    pub fn catalog_stream(&self) -> CatalogStream {
        let properties: serde_json::Map<String, JsonValue> = self
            .select
            .iter()
            .chain(self.primary_key.iter())
            .chain(std::iter::once(&self.cursor_field))
            .map(|field| {
                (
                    field.clone(),
                    serde_json::json!({ "type": ["null", "string"] }),
                )
            })
            .collect();

        CatalogStream {
            name: self.name.clone(),
            json_schema: serde_json::json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "additionalProperties": true,
                "properties": properties,
            }),
            supported_sync_modes: vec![SyncMode::FullRefresh, SyncMode::Incremental],
            source_defined_cursor: true,
            default_cursor_field: vec![self.cursor_field.clone()],
            source_defined_primary_key: self.primary_key.iter().map(|k| vec![k.clone()]).collect(),
        }
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl HttpConfig {
    /// Client config for a stream
    pub fn client_config(&self, stream: &StreamConfig) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&stream.base_url)
            .timeout(Duration::from_secs(self.timeout_seconds));
        for (key, value) in &stream.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Discovered catalog (available streams)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

/// Stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,

    /// JSON schema for the stream
    #[serde(default)]
    pub json_schema: JsonValue,

    /// Supported sync modes
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,

    /// Whether the cursor is chosen by the connector
    #[serde(default)]
    pub source_defined_cursor: bool,

    /// Default cursor field path
    #[serde(default)]
    pub default_cursor_field: Vec<String>,

    /// Source-defined primary key
    #[serde(default)]
    pub source_defined_primary_key: Vec<Vec<String>>,
}

// ============================================================================
// Loading
// ============================================================================

/// Load a JSON or YAML config file into a JSON value
pub fn load_config_file(path: impl AsRef<Path>) -> Result<JsonValue> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let context = || format!("Invalid config file {}", path.display());
    if is_yaml {
        serde_yaml::from_str(&contents).with_context(context)
    } else {
        serde_json::from_str(&contents).with_context(context)
    }
}

/// Deserialize a typed config from a JSON value, naming missing fields
pub fn from_value<T: serde::de::DeserializeOwned>(value: JsonValue) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::config(e.to_string()))
}
