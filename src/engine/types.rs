//! Engine types
//!
//! Message types and statistics for the sync engine.

use crate::state::StreamState;
use crate::types::{LogLevel, Record};
use chrono::{DateTime, Utc};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One accepted record
    Record {
        /// Stream name
        stream: String,
        /// The record
        data: Record,
        /// When the record was emitted
        emitted_at: DateTime<Utc>,
    },
    /// Checkpoint of a stream
    State {
        /// Stream name
        stream: String,
        /// Checkpoint values
        data: StreamState,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, data: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            data,
            emitted_at: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(stream: impl Into<String>, data: StreamState) -> Self {
        Self::State {
            stream: stream.into(),
            data,
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// The record payload, if this is a record message
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record { data, .. } => Some(data),
            _ => None,
        }
    }

    /// The checkpoint payload, if this is a state message
    pub fn as_state(&self) -> Option<&StreamState> {
        match self {
            Self::State { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records returned by the API
    pub records_read: u64,
    /// Records that passed the cursor filter
    pub records_emitted: u64,
    /// Pages fetched
    pub pages_fetched: u64,
    /// Checkpoints emitted
    pub states_emitted: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a fetched page and its records
    pub fn add_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.records_read += records as u64;
    }

    /// Count an emitted record
    pub fn add_record(&mut self) {
        self.records_emitted += 1;
    }

    /// Count an emitted checkpoint
    pub fn add_state(&mut self) {
        self.states_emitted += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Records dropped by the cursor filter
    pub fn records_filtered(&self) -> u64 {
        self.records_read.saturating_sub(self.records_emitted)
    }
}
