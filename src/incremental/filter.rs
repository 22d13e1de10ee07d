//! Cursor filtering
//!
//! Drops records older than the stored checkpoint. Comparison is on the raw
//! cursor strings, so the stored value and the API's values must share a
//! lexicographically ordered shape (ISO-8601 in practice).

use crate::error::{Error, Result};
use crate::state::StreamState;
use crate::types::Record;

/// Read the cursor value of a record as a string
pub fn cursor_value<'r>(record: &'r Record, cursor_field: &str) -> Result<&'r str> {
    record
        .get(cursor_field)
        .and_then(|value| value.as_str())
        .ok_or_else(|| Error::missing_cursor(cursor_field))
}

/// Keeps records whose cursor is at or after the stored checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorFilter {
    cursor_field: String,
    threshold: Option<String>,
}

impl CursorFilter {
    /// Filter against an explicit threshold; `None` passes everything
    pub fn new(cursor_field: impl Into<String>, threshold: Option<String>) -> Self {
        Self {
            cursor_field: cursor_field.into(),
            threshold,
        }
    }

    /// Filter against the value stored under `state_key`, if any
    pub fn from_state(
        cursor_field: impl Into<String>,
        state_key: &str,
        state: Option<&StreamState>,
    ) -> Self {
        let threshold = state.and_then(|s| s.get(state_key)).map(ToString::to_string);
        Self::new(cursor_field, threshold)
    }

    /// The stored checkpoint records are compared against
    pub fn threshold(&self) -> Option<&str> {
        self.threshold.as_deref()
    }

    /// Whether a record passes.
    ///
    /// Ties pass, so the last record of the previous sync is seen again.
    pub fn accepts(&self, record: &Record) -> Result<bool> {
        match &self.threshold {
            None => Ok(true),
            Some(threshold) => {
                let value = cursor_value(record, &self.cursor_field)?;
                Ok(value >= threshold.as_str())
            }
        }
    }

    /// Lazily filter a page of records, preserving order
    pub fn filter<'a, I>(&'a self, records: I) -> impl Iterator<Item = Result<Record>> + 'a
    where
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'a,
    {
        records
            .into_iter()
            .filter_map(move |record| match self.accepts(&record) {
                Ok(true) => Some(Ok(record)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
    }
}
