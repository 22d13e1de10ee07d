//! Incremental sync module
//!
//! Cursor-based incremental extraction over modification timestamps.
//!
//! # Overview
//!
//! - `CursorFilter` drops records older than the stored checkpoint
//! - `StateMerger` advances the checkpoint as records are accepted
//! - `CursorFormat` parses and writes the connector's timestamp shape

mod filter;
mod format;
mod merge;

pub use filter::{cursor_value, CursorFilter};
pub use format::{CursorFormat, InitialCheckpoint};
pub use merge::StateMerger;

#[cfg(test)]
mod tests;
