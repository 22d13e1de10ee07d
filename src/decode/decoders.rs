//! Decoder implementations

use super::types::{RecordDecoder, DEFAULT_RECORDS_KEY};
use crate::error::{Error, Result};
use crate::types::Record;
use serde_json::Value;

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder reading records from a top-level key
///
/// The key may hold a list of records or a single record object. The body
/// itself is never taken as a record: a bare entity response without the
/// key (e.g. `Property('X')`) is a `RecordExtraction` error, since listing
/// endpoints always wrap results in a collection.
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    /// Key holding the record list (or single record)
    records_key: String,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::with_key(DEFAULT_RECORDS_KEY)
    }
}

impl JsonDecoder {
    /// Create a decoder reading the `value` key
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder reading records from `key`
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            records_key: key.into(),
        }
    }

    /// The configured records key
    pub fn records_key(&self) -> &str {
        &self.records_key
    }

    fn as_record(&self, value: &Value, index: usize) -> Result<Record> {
        match value {
            Value::Object(map) => Ok(map.clone()),
            other => Err(Error::record_extraction(
                &self.records_key,
                format!("element {index} is not an object: {other}"),
            )),
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode_raw(&self, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }

    fn records(&self, body: &Value) -> Result<Vec<Record>> {
        let Some(payload) = body.get(&self.records_key) else {
            return Err(Error::record_extraction(
                &self.records_key,
                "key not present in response",
            ));
        };

        match payload {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.as_record(item, index))
                .collect(),
            Value::Object(map) => Ok(vec![map.clone()]),
            other => Err(Error::record_extraction(
                &self.records_key,
                format!("expected an array or object, got {other}"),
            )),
        }
    }
}
