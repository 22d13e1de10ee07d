//! Single-page fetching
//!
//! Issues one GET per page and splits the response into records and the
//! next continuation token.

use super::types::{merge_params, Page, PageToken, Paginator};
use crate::decode::RecordDecoder;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Fetches pages of one listing endpoint
pub struct PageFetcher {
    client: Arc<HttpClient>,
    path: String,
    base_params: BTreeMap<String, String>,
    decoder: Box<dyn RecordDecoder>,
    paginator: Box<dyn Paginator>,
}

impl PageFetcher {
    /// Create a fetcher for `path` with fixed query parameters
    pub fn new(
        client: Arc<HttpClient>,
        path: impl Into<String>,
        base_params: BTreeMap<String, String>,
        decoder: Box<dyn RecordDecoder>,
        paginator: Box<dyn Paginator>,
    ) -> Self {
        Self {
            client,
            path: path.into(),
            base_params,
            decoder,
            paginator,
        }
    }

    /// Fixed parameters sent with every page
    pub fn base_params(&self) -> &BTreeMap<String, String> {
        &self.base_params
    }

    /// Fetch one page, continuing from `token` when given
    pub async fn fetch_page(&self, token: Option<&PageToken>) -> Result<Page> {
        let mut request = RequestConfig::new();
        request.query = merge_params(&self.base_params, token);

        let response = self.client.get_with_config(&self.path, request).await?;
        let body = response.text().await?;
        let json = self.decoder.decode_raw(&body)?;

        let records = self.decoder.records(&json)?;
        let next = self.paginator.next_token(&json)?;

        debug!(
            path = %self.path,
            records = records.len(),
            next = ?next.as_ref().map(ToString::to_string),
            "Fetched page"
        );

        Ok(Page { records, next })
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("path", &self.path)
            .field("base_params", &self.base_params)
            .finish_non_exhaustive()
    }
}
