//! AgencyZoom client

use crate::auth::{Credentials, Session};
use crate::config::AgencyZoomConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, RetryPolicy};
use crate::pagination::{ListRequest, PaginatedFetcher};
use crate::types::{Message, Thread};
use serde_json::Value;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::path::PathBuf;
use tracing::debug;

pub const LOGIN_PATH: &str = "/v1/api/auth/login";
pub const THREAD_LIST_PATH: &str = "/v1/api/text-thread/list";
pub const THREAD_DETAIL_PATH: &str = "/v1/api/text-thread/text-thread-detail";
pub const PRODUCER_PATH: &str = "/v1/api/text-thread/producer";
pub const UNREAD_THREAD_PATH: &str = "/v1/api/text-thread/unread-thread";

const THREAD_KEYS: &[&str] = &["threadInfo", "items", "threads"];
const MESSAGE_KEYS: &[&str] = &["messageInfo", "items", "messages"];

/// Parameters for listing threads
#[derive(Debug, Clone, Default)]
pub struct ThreadQuery {
    pub page_size: u32,
    pub limit: Option<usize>,
    /// `agentSelect`: only threads assigned to this user
    pub agent: Option<String>,
    /// `lastDateUTC`: only threads active since this time
    pub active_since: Option<DateTime<Utc>>,
}

impl ThreadQuery {
    /// Query described by the configuration, with the backfill window ending at `now`
    pub fn from_config(config: &AgencyZoomConfig, now: DateTime<Utc>) -> Self {
        Self {
            page_size: config.threads_page_size,
            limit: config.thread_limit,
            agent: config.agent_filter().map(str::to_string),
            active_since: config
                .backfill_minutes
                .map(|minutes| now - ChronoDuration::minutes(minutes)),
        }
    }

    fn to_request(&self, max_pages: Option<u32>) -> ListRequest {
        let mut request = ListRequest::new(THREAD_LIST_PATH, "AgencyZoom threads")
            .field("sort", "lastMessageDate")
            .field("order", "desc")
            .item_keys(THREAD_KEYS)
            .page_size(self.page_size)
            .limit(self.limit)
            .max_pages(max_pages)
            .dump_prefix("threads");
        if let Some(ref agent) = self.agent {
            request = request.field("agentSelect", agent.as_str());
        }
        if let Some(since) = self.active_since {
            request = request.field("lastDateUTC", since.to_rfc3339());
        }
        request
    }
}

/// Reads text threads and their messages
#[derive(Debug)]
pub struct AgencyZoomClient {
    fetcher: PaginatedFetcher,
    base_url: String,
    max_pages: Option<u32>,
}

impl AgencyZoomClient {
    /// Wrap an HTTP client pointed at `base_url` (the host, without `/v1/api`)
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            fetcher: PaginatedFetcher::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_pages: None,
        }
    }

    /// Build a client from configuration; raw pages go to `raw_dir` when set
    pub fn from_config(config: &AgencyZoomConfig, raw_dir: Option<PathBuf>) -> Result<Self> {
        let mut http = HttpClientConfig::builder()
            .base_url(&config.base_url)
            .timeout(config.request_timeout)
            .retry(RetryPolicy::agencyzoom());
        if let Some(rps) = config.max_requests_per_second {
            http = http.rate_limit(RateLimiterConfig::per_second(rps));
        }

        let client = HttpClient::new(http.build())?;
        Ok(Self::new(client, &config.base_url)
            .with_start_page(config.start_page)
            .with_max_pages(config.max_pages)
            .with_dump_dir(raw_dir))
    }

    /// First page index sent to the API
    #[must_use]
    pub fn with_start_page(mut self, start_page: u32) -> Self {
        self.fetcher = self.fetcher.with_start_page(start_page);
        self
    }

    /// Stop every listing after this many pages
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Save every raw page under `dir`
    #[must_use]
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.fetcher = self.fetcher.with_dump_dir(dir);
        self
    }

    /// Login endpoint URL
    pub fn login_url(&self) -> String {
        format!("{}{LOGIN_PATH}", self.base_url)
    }

    /// A fresh, not yet authenticated session
    pub fn session(&self, credentials: Credentials) -> Session {
        Session::new(credentials, self.login_url())
    }

    /// Log in if the session holds no token yet
    pub async fn login(&self, session: &mut Session) -> Result<()> {
        session.token(self.fetcher.client()).await?;
        Ok(())
    }

    /// Every thread matching `query`, newest activity first
    pub async fn list_threads(&self, session: &mut Session, query: &ThreadQuery) -> Result<Vec<Thread>> {
        let items = self
            .fetcher
            .fetch_all(session, &query.to_request(self.max_pages))
            .await?;

        let total = items.len();
        let threads: Vec<Thread> = items.iter().filter_map(Thread::from_value).collect();
        if threads.len() < total {
            debug!("Skipped {} threads without an id", total - threads.len());
        }
        Ok(threads)
    }

    /// Messages of one thread
    pub async fn thread_messages(
        &self,
        session: &mut Session,
        thread_id: &str,
        page_size: u32,
        limit: Option<usize>,
    ) -> Result<Vec<Message>> {
        let request = ListRequest::new(THREAD_DETAIL_PATH, "AgencyZoom messages")
            .field("threadId", thread_id)
            .item_keys(MESSAGE_KEYS)
            .page_size(page_size)
            .limit(limit)
            .max_pages(self.max_pages)
            .dump_prefix(format!("thread_{thread_id}_messages"));

        let items = self.fetcher.fetch_all(session, &request).await?;
        let total = items.len();
        let messages: Vec<Message> = items
            .iter()
            .filter_map(|item| Message::from_value(thread_id, item))
            .collect();
        if messages.len() < total {
            debug!(
                "Skipped {} messages without an id in thread {thread_id}",
                total - messages.len()
            );
        }
        Ok(messages)
    }

    /// First page of producer (assignment) data, as returned.
    ///
    /// Payloads vary by tenant; `agent` is sent as `agentSelect` when set.
    pub async fn producer(&self, session: &mut Session, page_size: u32, agent: Option<&str>) -> Result<Value> {
        let mut request = ListRequest::new(PRODUCER_PATH, "AgencyZoom producer")
            .page_size(page_size)
            .dump_prefix("producer");
        if let Some(agent) = agent {
            request = request.field("agentSelect", agent);
        }
        self.fetcher.fetch_one(session, &request).await
    }

    /// First page of unread thread counters, as returned
    pub async fn unread_threads(&self, session: &mut Session, page_size: u32) -> Result<Value> {
        let request = ListRequest::new(UNREAD_THREAD_PATH, "AgencyZoom unread threads")
            .page_size(page_size)
            .dump_prefix("unread_thread");
        self.fetcher.fetch_one(session, &request).await
    }
}
