//! State management module
//!
//! Handles cursor checkpoints between sync runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - per-stream checkpoints, `{stream: {state_key: value}}`
//! - `StateManager` - in-memory or file-backed persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamState};
