//! Pagination types and traits
//!
//! Defines the continuation token, the page abstraction and the paginator
//! trait used by every listing stream.

use crate::error::{Error, Result};
use crate::types::Record;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Query parameters that continue pagination, e.g. `{"$skip": "200"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PageToken {
    params: BTreeMap<String, String>,
}

impl PageToken {
    /// Create an empty token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut token = Self::new();
        token.insert(key, value);
        token
    }

    /// Add or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All parameters in key order
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Whether the token holds no parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}", pairs.join("&"))
    }
}

/// One fetched page: its records and the token for the next page
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records on this page, in response order
    pub records: Vec<Record>,
    /// Continuation token; `None` ends pagination
    pub next: Option<PageToken>,
}

impl Page {
    /// Whether this is the last page
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Merge fixed request parameters with a continuation token.
///
/// Token parameters replace fixed parameters with the same key.
pub fn merge_params(
    base: &BTreeMap<String, String>,
    token: Option<&PageToken>,
) -> BTreeMap<String, String> {
    let mut params = base.clone();
    if let Some(token) = token {
        for (key, value) in token.params() {
            params.insert(key.clone(), value.clone());
        }
    }
    params
}

/// Tracks pagination progress during one sync
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Tokens already requested in this sync
    seen: HashSet<PageToken>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page
    pub fn add_page(&mut self, records: usize) {
        self.pages += 1;
        self.total_fetched += records as u64;
    }

    /// Register a token about to be requested.
    ///
    /// Fails if the same token was already requested in this sync.
    pub fn claim(&mut self, token: &PageToken) -> Result<()> {
        if self.seen.insert(token.clone()) {
            Ok(())
        } else {
            Err(Error::pagination(format!(
                "continuation token '{token}' was returned twice"
            )))
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Extract the next continuation token from a response body
    fn next_token(&self, body: &Value) -> Result<Option<PageToken>>;
}
