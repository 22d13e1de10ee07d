//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs. The wire
//! shape is `{"<stream>": {"<state_key>": "<cursor value>"}}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a connector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    /// Per-stream state
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Replace the state of a stream
    pub fn set_stream(&mut self, stream: impl Into<String>, state: StreamState) {
        self.streams.insert(stream.into(), state);
    }

    /// Get a cursor value of a stream
    pub fn get_cursor(&self, stream: &str, key: &str) -> Option<&str> {
        self.streams.get(stream)?.get(key)
    }

    /// Set a cursor value of a stream
    pub fn set_cursor(&mut self, stream: &str, key: impl Into<String>, value: impl Into<String>) {
        self.get_stream_mut(stream).set(key, value);
    }

    /// Whether no stream has state
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Checkpoint of a single stream: state key to last-seen cursor value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamState {
    values: BTreeMap<String, String>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether no value is stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values in key order
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}
