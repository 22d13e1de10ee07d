//! Response decoder module
//!
//! Turns an OData listing response body into records.
//!
//! # Overview
//!
//! Listing endpoints wrap their records in a top-level key (`value`). Most
//! return an array there; some return a single object, which is treated as a
//! one-record page.

mod decoders;
mod types;

pub use decoders::JsonDecoder;
pub use types::{RecordDecoder, DEFAULT_RECORDS_KEY};
