//! # RESO Listing Connectors
//!
//! Incremental extraction of real-estate listings from RESO Web API
//! (OData) providers.
//!
//! ## Features
//!
//! - **Presets**: Bridge Interactive, Spark (FBS) and Trestle (CoreLogic), plus
//!   a generic OData connector configured entirely by data
//! - **Auth**: static bearer tokens and OAuth2 client credentials with token caching
//! - **Pagination**: `@odata.nextLink` following with `$skip` / `$skiptoken` continuation
//! - **Incremental Sync**: cursor filtering against the stored checkpoint and a
//!   max-merged checkpoint emitted at the end of each sync
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use reso_connectors::connector::{Connector, ResoConnector};
//! use reso_connectors::connectors::ConnectorKind;
//! use reso_connectors::SyncMode;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> reso_connectors::Result<()> {
//!     let config = serde_json::json!({
//!         "server_token": "abc123",
//!         "dataset": "test",
//!         "brokerage_key": "OFF"
//!     });
//!     let connector = ResoConnector::from_value(ConnectorKind::Bridge, config)?;
//!
//!     let mut messages = connector.read(SyncMode::Incremental, None).await?;
//!     while let Some(msg) = messages.next().await {
//!         println!("{:?}", msg?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Connector (spec/check/discover/read)       │
//! │            presets: bridge · spark · trestle · odata        │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────┬──────────┬───────┴──────┬─────────────┬──────────┐
//! │   Auth   │   HTTP   │  Pagination  │ Incremental │  State   │
//! ├──────────┼──────────┼──────────────┼─────────────┼──────────┤
//! │ Bearer   │ GET      │ nextLink     │ Filter      │ JSON     │
//! │ OAuth2   │ Headers  │ $skip        │ Merge (max) │ file     │
//! └──────────┴──────────┴──────────────┴─────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Bearer and OAuth2 client-credentials authentication
pub mod auth;

/// HTTP client
pub mod http;

/// OData pagination
pub mod pagination;

/// Response decoders
pub mod decode;

/// Cursor formats, filtering and checkpoint merging
pub mod incremental;

/// State management and checkpointing
pub mod state;

/// Sync engine
pub mod engine;

/// Stream configuration and catalog
pub mod config;

/// Built-in connector presets
pub mod connectors;

/// Connector trait and the listing connector
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use connector::{Connector, ResoConnector};
pub use connectors::ConnectorKind;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
