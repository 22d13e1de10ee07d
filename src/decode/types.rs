//! Decoder types and traits
//!
//! Defines the core decoder abstraction.

use crate::error::Result;
use crate::types::Record;
use serde_json::Value;

/// Key holding the records in an OData response
pub const DEFAULT_RECORDS_KEY: &str = "value";

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Parse the raw response body into a JSON document
    fn decode_raw(&self, body: &str) -> Result<Value>;

    /// Extract the records from an already parsed response
    fn records(&self, body: &Value) -> Result<Vec<Record>>;

    /// Parse the body and extract its records
    fn decode(&self, body: &str) -> Result<Vec<Record>> {
        let value = self.decode_raw(body)?;
        self.records(&value)
    }
}
