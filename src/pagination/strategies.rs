//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{PageToken, Paginator};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Response field carrying the OData next link
pub const ODATA_NEXT_LINK: &str = "@odata.nextLink";

// ============================================================================
// Next Link Pagination
// ============================================================================

/// OData next-link pagination
///
/// Reads the next page link from a response field and keeps only the
/// continuation parameters from its query string:
/// - `{"@odata.nextLink": ".../Property?$top=200&$skip=400"}` -> `{$skip: 400}`
/// - `{"@odata.nextLink": ".../Property?$skiptoken=abc"}` -> `{$skiptoken: abc}`
#[derive(Debug, Clone)]
pub struct NextLinkPaginator {
    /// Response field holding the next link
    pub link_field: String,
    /// Query parameters carried over from the next link
    pub continuation_keys: Vec<String>,
}

impl NextLinkPaginator {
    /// Create a paginator reading `link_field` and keeping `continuation_keys`
    pub fn new<I, S>(link_field: impl Into<String>, continuation_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            link_field: link_field.into(),
            continuation_keys: continuation_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// `@odata.nextLink` pagination continuing on `$skip`
    pub fn skip() -> Self {
        Self::new(ODATA_NEXT_LINK, ["$skip"])
    }

    /// `@odata.nextLink` pagination continuing on `$skiptoken`
    pub fn skip_token() -> Self {
        Self::new(ODATA_NEXT_LINK, ["$skiptoken"])
    }
}

impl Paginator for NextLinkPaginator {
    fn next_token(&self, body: &Value) -> Result<Option<PageToken>> {
        let link = match body.get(&self.link_field) {
            Some(Value::String(link)) if !link.is_empty() => link,
            _ => return Ok(None),
        };

        let params = query_params(link)?;
        let mut token = PageToken::new();
        for key in &self.continuation_keys {
            let value = params.get(key).ok_or_else(|| {
                Error::pagination(format!("next link '{link}' has no '{key}' parameter"))
            })?;
            token.insert(key.clone(), value.clone());
        }

        Ok(Some(token))
    }
}

/// Decode the query string of an absolute or relative link.
///
/// Later duplicates win; parameters with empty values are dropped.
fn query_params(link: &str) -> Result<HashMap<String, String>> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://localhost/")?.join(link)?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(url
        .query_pairs()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}
