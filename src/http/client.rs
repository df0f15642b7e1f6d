//! HTTP client with rate-limit retry
//!
//! Provides the client both API integrations go through. It handles:
//! - Retrying 429 responses, honoring `Retry-After`
//! - Optionally retrying transient 5xx responses
//! - Optional client-side pacing
//! - Best-effort raw response dumps
//!
//! Authentication failures are NOT retried here: the caller owns the session
//! and decides whether it may log in again.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::sleeper::{Sleeper, TokioSleeper};
use crate::error::{Error, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How many characters of a response body are logged at debug level
const DEBUG_PREVIEW_CHARS: usize = 500;

/// Retry behavior for throttled or transient responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed per request after the first attempt
    pub max_retries: u32,
    /// Wait used when a 429 carries no usable `Retry-After`
    pub default_retry_after: Duration,
    /// Also retry 500/502/503/504
    pub retry_server_errors: bool,
}

impl RetryPolicy {
    /// AgencyZoom: two 429 retries, 60s default wait
    pub fn agencyzoom() -> Self {
        Self {
            max_retries: 2,
            default_retry_after: Duration::from_secs(60),
            retry_server_errors: false,
        }
    }

    /// Todoist: one retry on 429 or 5xx, 2s default wait
    pub fn todoist() -> Self {
        Self {
            max_retries: 1,
            default_retry_after: Duration::from_secs(2),
            retry_server_errors: true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::agencyzoom()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Retry behavior
    pub retry: RetryPolicy,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: None,
            user_agent: format!("az-sms-bridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Bearer token for the Authorization header
    pub bearer: Option<String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Body fields replaced with `***` in debug logs
    pub redact: Vec<String>,
    /// Write the raw response body here (best effort)
    pub dump_path: Option<PathBuf>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Authenticate with a bearer token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Hide a body field in debug logs
    #[must_use]
    pub fn redact(mut self, field: impl Into<String>) -> Self {
        self.redact.push(field.into());
        self
    }

    /// Dump the raw response body to a file
    #[must_use]
    pub fn dump_to(mut self, path: Option<PathBuf>) -> Self {
        self.dump_path = path;
        self
    }

    pub(crate) fn loggable_body(&self) -> Option<Value> {
        let mut body = self.body.clone()?;
        if let Value::Object(map) = &mut body {
            for field in &self.redact {
                if let Some(v) = map.get_mut(field) {
                    *v = Value::String("***".to_string());
                }
            }
        }
        Some(body)
    }
}

/// A fully-read HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Status code
    pub status: StatusCode,
    /// Response body text
    pub body: String,
}

impl ApiResponse {
    /// 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        )
    }

    /// Turn a non-2xx response into [`Error::HttpStatus`] with a truncated body
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::http_status(self.status.as_u16(), &self.body))
        }
    }

    /// Parse the body as JSON, reporting a snippet on failure
    pub fn json(&self, context: &str) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|_| Error::parse(context, &self.body))
    }

    /// Like [`ApiResponse::json`] but an empty body yields `Value::Null`
    pub fn json_or_null(&self, context: &str) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        self.json(context)
    }
}

/// HTTP client with rate-limit retry and optional pacing
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used for backoff waits
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, config: RequestConfig) -> Result<ApiResponse> {
        self.request(Method::GET, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, config: RequestConfig) -> Result<ApiResponse> {
        self.request(Method::POST, url, config).await
    }

    /// Make a request, retrying throttled responses per the retry policy.
    ///
    /// Any response that is not retried is returned as-is, including 4xx/5xx;
    /// use [`ApiResponse::error_for_status`] to turn those into errors.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse> {
        let full_url = self.build_url(url);
        let policy = &self.config.retry;
        let mut retries = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.request(method.clone(), &full_url);
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            if let Some(ref token) = config.bearer {
                req = req.bearer_auth(token);
            }
            if let Some(ref body) = config.body {
                req = req.json(body);
            }

            match config.loggable_body() {
                Some(body) => debug!("{} {} payload={}", method, full_url, body),
                None => debug!("{} {}", method, full_url),
            }

            let response = req.send().await?;
            let status = response.status();
            let retry_after = extract_retry_after(&response);
            let body = response.text().await?;

            debug!(
                "response status={} body preview={:?}",
                status.as_u16(),
                preview(&body)
            );

            if let Some(ref path) = config.dump_path {
                dump_body(path, &body);
            }

            let throttled = status == StatusCode::TOO_MANY_REQUESTS;
            let transient = policy.retry_server_errors && is_transient_status(status);

            if throttled || transient {
                let wait = retry_after.unwrap_or(policy.default_retry_after);
                if retries < policy.max_retries {
                    retries += 1;
                    warn!(
                        "{} {} returned {}, retry {}/{} in {}s",
                        method,
                        full_url,
                        status.as_u16(),
                        retries,
                        policy.max_retries,
                        wait.as_secs()
                    );
                    self.sleeper.sleep(wait).await;
                    continue;
                }
                if throttled {
                    return Err(Error::RateLimited {
                        retry_after_seconds: wait.as_secs(),
                        attempts: retries + 1,
                    });
                }
            }

            return Ok(ApiResponse { status, body });
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Statuses worth one more try when the policy allows it
fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

/// Integer-seconds `Retry-After`; anything else is ignored
fn extract_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(DEBUG_PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn dump_body(path: &Path, body: &str) {
    let result = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::write(path, body));
    if let Err(e) = result {
        warn!("Failed to dump response to {}: {e}", path.display());
    }
}
