//! CLI runner - executes commands
//!
//! Every command writes JSON protocol messages, one per line, to the output
//! writer (stdout for the binary). Diagnostics go through `tracing`.

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::load_config_file;
use crate::connector::{CheckResult, Connector, ConnectorSpec, ResoConnector};
use crate::connectors::{list_builtin_info, ConnectorKind};
use crate::engine::{Message, SyncStats};
use crate::error::{Error, Result};
use crate::state::StateManager;
use crate::types::{LogLevel, SyncMode};
use futures::StreamExt;
use serde_json::{json, Value};
use std::io::Write;
use std::time::Instant;
use tracing::error;

/// CLI runner
pub struct Runner<W: Write = std::io::Stdout> {
    cli: Cli,
    out: W,
}

impl Runner {
    /// Create a runner writing to stdout
    pub fn new(cli: Cli) -> Self {
        Self::with_writer(cli, std::io::stdout())
    }
}

impl<W: Write> Runner<W> {
    /// Create a runner writing to `out`
    pub fn with_writer(cli: Cli, out: W) -> Self {
        Self { cli, out }
    }

    /// Consume the runner and return its writer
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Run the CLI command
    pub async fn run(&mut self) -> Result<()> {
        match &self.cli.command {
            Commands::Check { config_json } => {
                let config_json = config_json.clone();
                self.check(config_json.as_deref()).await
            }
            Commands::Discover { config_json } => {
                let config_json = config_json.clone();
                self.discover(config_json.as_deref()).await
            }
            Commands::Read {
                config_json,
                full_refresh,
            } => {
                let config_json = config_json.clone();
                let mode = if *full_refresh {
                    SyncMode::FullRefresh
                } else {
                    SyncMode::Incremental
                };
                self.read(config_json.as_deref(), mode).await
            }
            Commands::Spec => self.spec(),
            Commands::List => self.list_connectors(),
        }
    }

    /// Connector selected with `--connector`
    fn connector_kind(&self) -> Result<ConnectorKind> {
        self.cli
            .connector
            .as_deref()
            .ok_or_else(|| Error::missing_field("--connector"))?
            .parse()
    }

    /// Load configuration
    fn load_config(&self, inline: Option<&str>) -> Result<Value> {
        // Inline config takes precedence
        if let Some(json_str) = inline {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            return load_config_file(path);
        }

        Err(Error::config("No config given; use --config or --config-json"))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // `--state` and `--state-json` are mutually exclusive
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn build_connector(&self, inline: Option<&str>) -> Result<ResoConnector> {
        let kind = self.connector_kind()?;
        let config = self.load_config(inline)?;
        ResoConnector::from_value(kind, config)
    }

    /// Check connection
    async fn check(&mut self, config_json: Option<&str>) -> Result<()> {
        // Configuration problems are reported as a failed check
        let result = match self.build_connector(config_json) {
            Ok(connector) => {
                self.log(
                    LogLevel::Info,
                    &format!("Checking connection to {}", connector.config().kind),
                )?;
                connector.check().await
            }
            Err(e) => CheckResult::failure(e.to_string()),
        };

        let (status, message) = if result.success {
            ("SUCCEEDED", "Connection successful".to_string())
        } else {
            ("FAILED", result.message.unwrap_or_default())
        };

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": status,
                "message": message
            }
        }))
    }

    /// Discover streams
    async fn discover(&mut self, config_json: Option<&str>) -> Result<()> {
        let connector = self.build_connector(config_json)?;
        let catalog = connector.discover().await?;

        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": catalog
        }))
    }

    /// Read data
    async fn read(&mut self, config_json: Option<&str>, mode: SyncMode) -> Result<()> {
        let sync_start = Instant::now();
        let connector = self.build_connector(config_json)?;
        let state = self.load_state()?;
        let snapshot = state.snapshot().await;

        let mut messages = connector.read(mode, Some(&snapshot)).await?;
        let mut stats = SyncStats::new();
        let mut failure = None;

        while let Some(message) = messages.next().await {
            match message {
                Ok(message) => {
                    if let Message::State { stream, data } = &message {
                        // Auto-saves when backed by a state file
                        state.set_stream(stream, data.clone()).await?;
                        stats.add_state();
                    } else if message.is_record() {
                        stats.add_record();
                    }
                    self.output_engine_message(&message)?;
                }
                Err(e) => {
                    error!(error = %e, "Sync failed");
                    self.log(LogLevel::Error, &format!("Sync failed: {e}"))?;
                    failure = Some(e);
                    break;
                }
            }
        }

        stats.set_duration(sync_start.elapsed().as_millis() as u64);

        let stream = &connector.config().stream;
        let state_file = self
            .cli
            .state
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        self.output_message(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": if failure.is_none() { "SUCCEEDED" } else { "FAILED" },
                "connector": connector.config().kind.name(),
                "stream": stream.name,
                "sync_mode": mode,
                "records_emitted": stats.records_emitted,
                "states_emitted": stats.states_emitted,
                "duration_ms": stats.duration_ms,
                "state_file": state_file
            }
        }))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Show spec
    fn spec(&mut self) -> Result<()> {
        let kind = self.connector_kind()?;
        let spec = ConnectorSpec::for_kind(kind);

        self.output_message(&json!({
            "type": "SPEC",
            "spec": spec
        }))
    }

    /// List built-in connectors
    fn list_connectors(&mut self) -> Result<()> {
        let connectors: Vec<Value> = list_builtin_info()
            .into_iter()
            .map(|info| {
                let config_fields: Vec<Value> = info
                    .config_schema
                    .iter()
                    .map(|field| {
                        json!({
                            "name": field.name,
                            "type": field.field_type,
                            "required": field.required,
                            "secret": field.secret,
                            "description": field.description,
                            "default": field.default
                        })
                    })
                    .collect();

                json!({
                    "name": info.name,
                    "description": info.description,
                    "aliases": info.aliases,
                    "config_schema": config_fields
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "CONNECTORS",
            "connectors": connectors
        }))
    }

    fn log(&mut self, level: LogLevel, message: &str) -> Result<()> {
        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": level.as_str(),
                "message": message
            }
        }))
    }

    /// Output a message
    fn output_message(&mut self, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    /// Output an engine message
    fn output_engine_message(&mut self, msg: &Message) -> Result<()> {
        match msg {
            Message::Record {
                stream,
                data,
                emitted_at,
            } => self.output_message(&json!({
                "type": "RECORD",
                "record": {
                    "stream": stream,
                    "data": data,
                    "emitted_at": emitted_at.timestamp_millis()
                }
            })),
            Message::State { stream, data } => self.output_message(&json!({
                "type": "STATE",
                "state": {
                    "type": "STREAM",
                    "stream": {
                        "stream_descriptor": {
                            "name": stream
                        },
                        "stream_state": data
                    }
                }
            })),
            Message::Log { level, message } => self.log(*level, message),
        }
    }
}
