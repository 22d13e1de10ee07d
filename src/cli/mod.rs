//! CLI module
//!
//! Command-line interface for running connectors.
//!
//! # Commands
//!
//! - `check` - Test the credentials
//! - `discover` - Describe the listing stream
//! - `read` - Extract listings incrementally
//! - `spec` - Show the configuration schema of a connector
//! - `list` - List built-in connectors

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
