//! Pagination module
//!
//! Supports: OData next-link (`$skip` / `$skiptoken`).
//!
//! # Overview
//!
//! A `PageFetcher` issues exactly one GET per page, merging the stream's
//! fixed query parameters with the continuation token of the previous page.
//! The `Paginator` strategy reads the next token out of the response body;
//! `None` means pagination is exhausted.

mod fetcher;
mod strategies;
mod types;

pub use fetcher::PageFetcher;
pub use strategies::{NextLinkPaginator, ODATA_NEXT_LINK};
pub use types::{merge_params, Page, PageToken, PaginationState, Paginator};

#[cfg(test)]
mod tests;
