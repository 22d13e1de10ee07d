//! Checkpoint merging
//!
//! Folds accepted records into the stream's checkpoint. Once a checkpoint
//! exists it only ever moves forward.

use super::filter::cursor_value;
use super::format::{CursorFormat, InitialCheckpoint};
use crate::error::Result;
use crate::state::StreamState;
use crate::types::Record;
use chrono::{DateTime, Utc};

/// Computes the next checkpoint from the current one and a record
#[derive(Debug, Clone)]
pub struct StateMerger {
    cursor_field: String,
    state_key: String,
    format: CursorFormat,
    initial: InitialCheckpoint,
}

impl StateMerger {
    /// Create a merger reading `cursor_field` and writing `state_key`
    pub fn new(
        cursor_field: impl Into<String>,
        state_key: impl Into<String>,
        format: CursorFormat,
        initial: InitialCheckpoint,
    ) -> Self {
        Self {
            cursor_field: cursor_field.into(),
            state_key: state_key.into(),
            format,
            initial,
        }
    }

    /// Key the checkpoint is stored under
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    /// Next checkpoint value.
    ///
    /// With no current value the checkpoint is derived from `now`, not from
    /// the record. Otherwise it is the later of the two timestamps.
    pub fn merge(
        &self,
        current: Option<&str>,
        record: &Record,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let Some(current) = current else {
            return self.format.format_utc(self.initial.at(now));
        };

        let stored = self.format.parse(current)?;
        let latest = self
            .format
            .parse(cursor_value(record, &self.cursor_field)?)?;

        self.format.format(&stored.max(latest))
    }

    /// Apply `merge` to the value held in `state`
    pub fn merge_into(
        &self,
        state: &mut StreamState,
        record: &Record,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let next = self.merge(state.get(&self.state_key), record, now)?;
        state.set(self.state_key.clone(), next);
        Ok(())
    }
}
