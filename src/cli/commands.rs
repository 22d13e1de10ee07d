//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RESO listing connectors CLI
#[derive(Parser, Debug)]
#[command(name = "reso-connectors")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connector name: bridge, spark, trestle or odata
    #[arg(short, long, global = true)]
    pub connector: Option<String>,

    /// Configuration file (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON); updated in place after a read
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON; not written back
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test the credentials
    Check {
        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,
    },

    /// Describe the listing stream
    Discover {
        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,
    },

    /// Read listings changed since the stored checkpoint
    Read {
        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,

        /// Ignore prior state and read everything
        #[arg(long)]
        full_refresh: bool,
    },

    /// Show connector configuration specification
    Spec,

    /// List built-in connectors
    List,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from([
            "reso-connectors",
            "--connector",
            "spark",
            "--state",
            "state.json",
            "read",
            "--config-json",
            "{}",
            "--full-refresh",
        ])
        .unwrap();

        assert_eq!(cli.connector.as_deref(), Some("spark"));
        assert_eq!(cli.state, Some(PathBuf::from("state.json")));
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Read {
                config_json,
                full_refresh,
            } => {
                assert_eq!(config_json.as_deref(), Some("{}"));
                assert!(full_refresh);
            }
            other => panic!("Expected Read, got {other:?}"),
        }
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["reso-connectors", "check", "-c", "bridge", "-f", "pretty"])
            .unwrap();
        assert_eq!(cli.connector.as_deref(), Some("bridge"));
        assert_eq!(cli.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_state_file_and_inline_state_conflict() {
        let err = Cli::try_parse_from([
            "reso-connectors",
            "--state",
            "state.json",
            "--state-json",
            "{}",
            "read",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
