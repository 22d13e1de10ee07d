//! Built-in connector presets
//!
//! Every supported listing API is the same OData stream with different
//! constants. A preset turns a small user config into a full
//! `StreamConfig` plus the auth it needs; the `odata` connector takes both
//! directly.

use crate::auth::AuthConfig;
use crate::config::{from_value, HttpConfig, StreamConfig};
use crate::error::{Error, Result};
use crate::incremental::{CursorFormat, InitialCheckpoint};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bridge Interactive OData base URL
pub const BRIDGE_BASE_URL: &str = "https://api.bridgedataoutput.com/api/v2/OData/";
/// Spark replication base URL
pub const SPARK_BASE_URL: &str = "https://replication.sparkapi.com/";
/// Trestle base URL
pub const TRESTLE_BASE_URL: &str = "https://api-prod.corelogic.com/trestle/";
/// Trestle OAuth2 token endpoint
pub const TRESTLE_TOKEN_URL: &str = "https://api-prod.corelogic.com/trestle/oidc/connect/token";

const SPARK_SELECT: &[&str] = &[
    "ListingKey",
    "ModificationTimestamp",
    "ListAgentFullName",
    "StreetAdditionalInfo",
    "StreetDirPrefix",
    "StreetDirSuffix",
    "StreetName",
    "StreetNumber",
    "StreetNumberNumeric",
    "StreetSuffix",
    "StreetSuffixModifier",
    "StateOrProvince",
    "StateRegion",
    "City",
    "CityRegion",
    "PostalCity",
    "PostalCode",
    "PostalCodePlus4",
];

// ============================================================================
// User Configs
// ============================================================================

/// Optional settings every preset accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetOverrides {
    /// Replace the preset's base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Extra fields appended to `$select`
    #[serde(default)]
    pub select: Vec<String>,
    /// Replace the preset's `$top`
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl PresetOverrides {
    fn apply(&self, stream: &mut StreamConfig, http: &mut HttpConfig) {
        if let Some(base_url) = &self.base_url {
            stream.base_url.clone_from(base_url);
        }
        stream.add_select(&self.select);
        if self.page_size.is_some() {
            stream.page_size = self.page_size;
        }
        if let Some(timeout) = self.timeout_seconds {
            http.timeout_seconds = timeout;
        }
    }
}

/// Bridge Interactive config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Server token used as bearer credential
    pub server_token: String,
    /// Dataset name, e.g. `test`
    pub dataset: String,
    /// Listings are limited to offices whose key starts with this
    pub brokerage_key: String,
    #[serde(flatten)]
    pub overrides: PresetOverrides,
}

/// Spark replication config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkConfig {
    /// Replication access token
    pub access_token: String,
    /// Value of the `X-SparkApi-User-Agent` header
    pub user_agent: String,
    #[serde(flatten)]
    pub overrides: PresetOverrides,
}

/// Trestle config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrestleConfig {
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Requested scopes
    #[serde(default = "default_trestle_scopes")]
    pub scopes: Vec<String>,
    /// Token endpoint override
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(flatten)]
    pub overrides: PresetOverrides,
}

fn default_trestle_scopes() -> Vec<String> {
    vec!["api".to_string()]
}

/// Generic OData config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ODataConfig {
    /// Credential for every request
    pub auth: AuthConfig,
    /// Full stream description
    pub stream: StreamConfig,
    /// HTTP settings
    #[serde(default)]
    pub http: HttpConfig,
}

// ============================================================================
// Connector Kind
// ============================================================================

/// Supported connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Bridge,
    Spark,
    Trestle,
    #[serde(rename = "odata")]
    OData,
}

/// A connector config resolved into everything a sync needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Which connector produced this config
    pub kind: ConnectorKind,
    /// The listing stream
    pub stream: StreamConfig,
    /// Credential
    pub auth: AuthConfig,
    /// HTTP settings
    pub http: HttpConfig,
}

impl ConnectorKind {
    /// All connectors, in listing order
    pub const ALL: [ConnectorKind; 4] = [
        ConnectorKind::Bridge,
        ConnectorKind::Spark,
        ConnectorKind::Trestle,
        ConnectorKind::OData,
    ];

    /// Connector name as used on the command line
    pub fn name(self) -> &'static str {
        match self {
            ConnectorKind::Bridge => "bridge",
            ConnectorKind::Spark => "spark",
            ConnectorKind::Trestle => "trestle",
            ConnectorKind::OData => "odata",
        }
    }

    /// Resolve a user config (JSON or YAML already parsed to JSON)
    pub fn resolve(self, config: JsonValue) -> Result<ResolvedConfig> {
        let resolved = match self {
            ConnectorKind::Bridge => bridge(from_value(config)?),
            ConnectorKind::Spark => spark(from_value(config)?),
            ConnectorKind::Trestle => trestle(from_value(config)?),
            ConnectorKind::OData => {
                let config: ODataConfig = from_value(config)?;
                ResolvedConfig {
                    kind: self,
                    stream: config.stream,
                    auth: config.auth,
                    http: config.http,
                }
            }
        };

        resolved.stream.validate()?;
        Ok(resolved)
    }

    /// Display metadata
    pub fn info(self) -> &'static ConnectorInfo {
        match self {
            ConnectorKind::Bridge => &BRIDGE_INFO,
            ConnectorKind::Spark => &SPARK_INFO,
            ConnectorKind::Trestle => &TRESTLE_INFO,
            ConnectorKind::OData => &ODATA_INFO,
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConnectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        ConnectorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name || kind.info().aliases.contains(&name.as_str()))
            .ok_or_else(|| Error::UnknownConnector {
                name: s.to_string(),
            })
    }
}

fn bridge(config: BridgeConfig) -> ResolvedConfig {
    let mut stream = StreamConfig::new(
        BRIDGE_BASE_URL,
        format!("{}/Property", config.dataset),
        "BridgeModificationTimestamp",
    );
    stream.select = vec![
        "ListAgentFullName".to_string(),
        "BridgeModificationTimestamp".to_string(),
    ];
    stream.filter = Some(format!(
        "startswith(ListOfficeKey, '{}')",
        config.brokerage_key
    ));
    stream.page_size = Some(200);
    stream.state_key = Some("updated_at".to_string());
    stream.cursor_format = CursorFormat::bridge();
    stream.initial_checkpoint = InitialCheckpoint::StartOfDay;

    let mut http = HttpConfig::default();
    config.overrides.apply(&mut stream, &mut http);

    ResolvedConfig {
        kind: ConnectorKind::Bridge,
        stream,
        auth: AuthConfig::bearer(config.server_token),
        http,
    }
}

fn spark(config: SparkConfig) -> ResolvedConfig {
    let mut stream = StreamConfig::new(
        SPARK_BASE_URL,
        "Reso/OData/Property",
        "ModificationTimestamp",
    );
    stream.select = SPARK_SELECT.iter().map(ToString::to_string).collect();
    stream.page_size = Some(1000);
    stream.continuation_keys = vec!["$skiptoken".to_string()];
    stream.cursor_format = CursorFormat::spark();
    stream
        .headers
        .insert("X-SparkApi-User-Agent".to_string(), config.user_agent);

    let mut http = HttpConfig::default();
    config.overrides.apply(&mut stream, &mut http);

    ResolvedConfig {
        kind: ConnectorKind::Spark,
        stream,
        auth: AuthConfig::bearer(config.access_token),
        http,
    }
}

fn trestle(config: TrestleConfig) -> ResolvedConfig {
    let mut stream = StreamConfig::new(TRESTLE_BASE_URL, "odata/Property", "ModificationTimestamp");
    stream.select = vec![
        "ModificationTimestamp".to_string(),
        "ListAgentFullName".to_string(),
        "ListingKey".to_string(),
    ];
    stream.page_size = Some(1000);
    stream.cursor_format = CursorFormat::trestle();

    let mut http = HttpConfig::default();
    config.overrides.apply(&mut stream, &mut http);

    let auth = AuthConfig::Oauth2ClientCredentials {
        token_url: config
            .token_url
            .unwrap_or_else(|| TRESTLE_TOKEN_URL.to_string()),
        client_id: config.client_id,
        client_secret: config.client_secret,
        scopes: config.scopes,
        expiry_margin_seconds: 0,
    };

    ResolvedConfig {
        kind: ConnectorKind::Trestle,
        stream,
        auth,
        http,
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Connector metadata for display
#[derive(Debug, Clone)]
pub struct ConnectorInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub config_schema: &'static [ConfigField],
}

/// Configuration field definition
#[derive(Debug, Clone)]
pub struct ConfigField {
    pub name: &'static str,
    pub field_type: &'static str,
    pub required: bool,
    pub secret: bool,
    pub description: &'static str,
    pub default: Option<&'static str>,
}

impl ConnectorInfo {
    /// JSON schema of the connector config
    pub fn connection_specification(&self) -> JsonValue {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for field in self.config_schema.iter().chain(OVERRIDE_FIELDS) {
            let mut property = serde_json::json!({
                "type": field.field_type,
                "description": field.description,
            });
            if field.secret {
                property["airbyte_secret"] = JsonValue::Bool(true);
            }
            if let Some(default) = field.default {
                property["default"] = JsonValue::String(default.to_string());
            }
            properties.insert(field.name.to_string(), property);
            if field.required {
                required.push(field.name);
            }
        }

        serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": self.name,
            "description": self.description,
            "type": "object",
            "required": required,
            "properties": properties,
        })
    }
}

/// Get detailed info about all built-in connectors
pub fn list_builtin_info() -> Vec<&'static ConnectorInfo> {
    ConnectorKind::ALL.iter().map(|kind| kind.info()).collect()
}

const OVERRIDE_FIELDS: &[ConfigField] = &[
    ConfigField {
        name: "base_url",
        field_type: "string",
        required: false,
        secret: false,
        description: "Override the API base URL",
        default: None,
    },
    ConfigField {
        name: "select",
        field_type: "array",
        required: false,
        secret: false,
        description: "Extra fields appended to $select",
        default: None,
    },
    ConfigField {
        name: "page_size",
        field_type: "integer",
        required: false,
        secret: false,
        description: "Records per page ($top)",
        default: None,
    },
    ConfigField {
        name: "timeout_seconds",
        field_type: "integer",
        required: false,
        secret: false,
        description: "HTTP request timeout in seconds",
        default: Some("30"),
    },
];

static BRIDGE_INFO: ConnectorInfo = ConnectorInfo {
    name: "bridge",
    description: "Bridge Interactive RESO Web API listings",
    aliases: &["bridge-interactive"],
    config_schema: &[
        ConfigField {
            name: "server_token",
            field_type: "string",
            required: true,
            secret: true,
            description: "Bridge server token (alphanumeric)",
            default: None,
        },
        ConfigField {
            name: "dataset",
            field_type: "string",
            required: true,
            secret: false,
            description: "Dataset name, e.g. 'test'",
            default: None,
        },
        ConfigField {
            name: "brokerage_key",
            field_type: "string",
            required: true,
            secret: false,
            description: "Prefix of the ListOfficeKey to extract",
            default: None,
        },
    ],
};

static SPARK_INFO: ConnectorInfo = ConnectorInfo {
    name: "spark",
    description: "Spark (FBS) RESO replication listings",
    aliases: &["sparkapi"],
    config_schema: &[
        ConfigField {
            name: "access_token",
            field_type: "string",
            required: true,
            secret: true,
            description: "Spark replication access token",
            default: None,
        },
        ConfigField {
            name: "user_agent",
            field_type: "string",
            required: true,
            secret: false,
            description: "Sent as X-SparkApi-User-Agent",
            default: None,
        },
    ],
};

static TRESTLE_INFO: ConnectorInfo = ConnectorInfo {
    name: "trestle",
    description: "CoreLogic Trestle RESO Web API listings",
    aliases: &["corelogic"],
    config_schema: &[
        ConfigField {
            name: "client_id",
            field_type: "string",
            required: true,
            secret: false,
            description: "OAuth2 client id",
            default: None,
        },
        ConfigField {
            name: "client_secret",
            field_type: "string",
            required: true,
            secret: true,
            description: "OAuth2 client secret",
            default: None,
        },
        ConfigField {
            name: "scopes",
            field_type: "array",
            required: false,
            secret: false,
            description: "OAuth2 scopes",
            default: Some("api"),
        },
        ConfigField {
            name: "token_url",
            field_type: "string",
            required: false,
            secret: false,
            description: "OAuth2 token endpoint",
            default: Some(TRESTLE_TOKEN_URL),
        },
    ],
};

static ODATA_INFO: ConnectorInfo = ConnectorInfo {
    name: "odata",
    description: "Any OData listing endpoint with next-link pagination",
    aliases: &[],
    config_schema: &[
        ConfigField {
            name: "auth",
            field_type: "object",
            required: true,
            secret: true,
            description: "{type: bearer, token} or {type: oauth2_client_credentials, ...}",
            default: None,
        },
        ConfigField {
            name: "stream",
            field_type: "object",
            required: true,
            secret: false,
            description: "base_url, path, cursor_field and optional stream settings",
            default: None,
        },
        ConfigField {
            name: "http",
            field_type: "object",
            required: false,
            secret: false,
            description: "{timeout_seconds}",
            default: None,
        },
    ],
};
