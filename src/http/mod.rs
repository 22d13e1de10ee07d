//! HTTP client module
//!
//! Provides the HTTP client used for listing requests.
//!
//! # Features
//!
//! - **Base URL joining**: relative paths resolve against the connector base
//! - **Default headers**: e.g. `X-SparkApi-User-Agent`
//! - **Authentication**: integration with the auth module
//! - **Strict status handling**: any non-2xx response is an error

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
