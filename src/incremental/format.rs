//! Cursor timestamp formats
//!
//! Each listing API writes its modification timestamps in a slightly
//! different shape. A `CursorFormat` parses them into comparable instants and
//! writes checkpoints back in the connector's own shape.

use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Parse and output patterns (chrono strftime syntax) for a cursor field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorFormat {
    /// Pattern used to parse cursor values
    pub parse: String,
    /// Pattern used to write checkpoints; defaults to `parse`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for CursorFormat {
    fn default() -> Self {
        Self::new("%Y-%m-%dT%H:%M:%S%.fZ")
    }
}

impl CursorFormat {
    /// Same pattern for parsing and writing
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            parse: pattern.into(),
            output: None,
        }
    }

    /// Separate parse and output patterns
    pub fn with_output(parse: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            parse: parse.into(),
            output: Some(output.into()),
        }
    }

    /// `2023-01-01T00:00:00.000Z`, written with microseconds
    pub fn bridge() -> Self {
        Self::with_output("%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%S%.6fZ")
    }

    /// `2023-01-01T00:00:00Z`
    pub fn spark() -> Self {
        Self::new("%Y-%m-%dT%H:%M:%SZ")
    }

    /// `2023-01-01T00:00:00.000+0000`, written with microseconds
    pub fn trestle() -> Self {
        Self::with_output("%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.6f%z")
    }

    /// Pattern used for writing
    pub fn output_pattern(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.parse)
    }

    /// Reject patterns chrono cannot interpret
    pub fn validate(&self) -> Result<()> {
        for pattern in [self.parse.as_str(), self.output_pattern()] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(Error::invalid_value(
                    "cursor_format",
                    format!("invalid timestamp pattern '{pattern}'"),
                ));
            }
        }
        Ok(())
    }

    fn has_offset(&self) -> bool {
        ["%z", "%:z", "%#z"]
            .iter()
            .any(|spec| self.parse.contains(spec))
    }

    /// Parse a cursor value.
    ///
    /// Patterns without an offset specifier are read as UTC. For patterns
    /// with one, a trailing `Z` is accepted as `+0000`.
    pub fn parse(&self, value: &str) -> Result<DateTime<FixedOffset>> {
        let parsed = if self.has_offset() {
            let normalized = match value.strip_suffix('Z') {
                Some(head) => format!("{head}+0000"),
                None => value.to_string(),
            };
            DateTime::parse_from_str(&normalized, &self.parse)
        } else {
            NaiveDateTime::parse_from_str(value, &self.parse)
                .map(|naive| Utc.fix().from_utc_datetime(&naive))
        };

        parsed.map_err(|e| Error::CursorParse {
            value: value.to_string(),
            format: self.parse.clone(),
            message: e.to_string(),
        })
    }

    /// Write an instant with the output pattern
    pub fn format(&self, instant: &DateTime<FixedOffset>) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", instant.format(self.output_pattern())).map_err(|_| {
            Error::invalid_value(
                "cursor_format",
                format!("cannot format with pattern '{}'", self.output_pattern()),
            )
        })?;
        Ok(out)
    }

    /// Write a UTC instant with the output pattern
    pub fn format_utc(&self, instant: DateTime<Utc>) -> Result<String> {
        self.format(&instant.with_timezone(&Utc.fix()))
    }
}

/// How the first checkpoint of a stream with no prior state is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialCheckpoint {
    /// The instant the first record is merged
    #[default]
    Now,
    /// Midnight UTC of the day the first record is merged
    StartOfDay,
}

impl InitialCheckpoint {
    /// Resolve the checkpoint instant for `now`
    pub fn at(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            InitialCheckpoint::Now => now,
            InitialCheckpoint::StartOfDay => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map_or(now, |midnight| Utc.from_utc_datetime(&midnight)),
        }
    }
}
