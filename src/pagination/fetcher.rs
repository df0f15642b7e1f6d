//! Resilient paginated fetch
//!
//! Guarantees per [`PaginatedFetcher::fetch_all`] call:
//! - at most one re-authentication, shared by all pages
//! - at most the client's retry budget of 429 retries per page request
//! - termination on an empty page, the item limit, or the page limit

use super::types::{extract_items, ListRequest};
use crate::auth::Session;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpClient, RequestConfig};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Re-authentications allowed per fetch
const REAUTH_BUDGET: u32 = 1;

/// Walks page-numbered POST list endpoints
#[derive(Debug)]
pub struct PaginatedFetcher {
    client: HttpClient,
    start_page: u32,
    dump_dir: Option<PathBuf>,
}

impl PaginatedFetcher {
    /// Create a fetcher starting at page 1 with no raw dumps
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            start_page: 1,
            dump_dir: None,
        }
    }

    /// First page index sent to the API
    #[must_use]
    pub fn with_start_page(mut self, start_page: u32) -> Self {
        self.start_page = start_page;
        self
    }

    /// Write every raw page body under `dir`
    #[must_use]
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Fetch every page of `request` and return the accumulated items
    pub async fn fetch_all(&self, session: &mut Session, request: &ListRequest) -> Result<Vec<Value>> {
        let mut items: Vec<Value> = Vec::new();
        let mut reauth_left = REAUTH_BUDGET;

        if request.limit == Some(0) {
            return Ok(items);
        }

        let mut page = self.start_page;
        let mut pages_fetched = 0u32;

        loop {
            if request.max_pages.is_some_and(|max| pages_fetched >= max) {
                debug!("{}: page limit reached", request.context);
                break;
            }

            let response = self
                .fetch_page(session, request, page, &mut reauth_left)
                .await?;
            let data = response.json(&request.context)?;
            let page_items = extract_items(data, &request.item_keys, &request.context)?;
            pages_fetched += 1;

            if page_items.is_empty() {
                debug!("{}: page {page} empty, done", request.context);
                break;
            }

            let count = page_items.len();
            items.extend(page_items);
            info!(
                "{}: page {page} -> {count} items (total {})",
                request.context,
                items.len()
            );

            if let Some(limit) = request.limit {
                if items.len() >= limit {
                    items.truncate(limit);
                    break;
                }
            }
            page += 1;
        }

        Ok(items)
    }

    /// Request a single page of `request` and return the parsed body as is
    pub async fn fetch_one(&self, session: &mut Session, request: &ListRequest) -> Result<Value> {
        let mut reauth_left = REAUTH_BUDGET;
        let response = self
            .fetch_page(session, request, self.start_page, &mut reauth_left)
            .await?;
        response.json(&request.context)
    }

    /// Request one page, re-authenticating while the budget allows
    async fn fetch_page(
        &self,
        session: &mut Session,
        request: &ListRequest,
        page: u32,
        reauth_left: &mut u32,
    ) -> Result<ApiResponse> {
        loop {
            let token = session.token(&self.client).await?;
            let config = RequestConfig::new()
                .bearer(token)
                .json(request.body_for(page))
                .dump_to(self.dump_path(request, page));

            let response = self.client.post(&request.endpoint, config).await?;

            if response.is_auth_failure() {
                if *reauth_left == 0 {
                    return Err(Error::auth(format!(
                        "{} rejected the token (HTTP {}) after re-authentication",
                        request.context,
                        response.status.as_u16()
                    )));
                }
                *reauth_left -= 1;
                warn!(
                    "{}: HTTP {} on page {page}, logging in again",
                    request.context,
                    response.status.as_u16()
                );
                session.refresh(&self.client).await?;
                continue;
            }

            return response.error_for_status();
        }
    }

    fn dump_path(&self, request: &ListRequest, page: u32) -> Option<PathBuf> {
        self.dump_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}_page_{page}.json", request.dump_prefix)))
    }
}
