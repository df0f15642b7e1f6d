//! Pagination module
//!
//! # Overview
//!
//! AgencyZoom list endpoints take a `page`/`pageSize` pair in a POST body and
//! signal the end with an empty page. [`PaginatedFetcher`] walks those pages,
//! re-authenticating once and riding out rate limits, and returns every item.

mod fetcher;
mod types;

pub use fetcher::PaginatedFetcher;
pub use types::{extract_items, ListRequest};
