//! HTTP client module
//!
//! Provides the HTTP client shared by the AgencyZoom and Todoist integrations.
//!
//! # Features
//!
//! - **429 Handling**: Honors `Retry-After`, bounded number of retries
//! - **Optional Pacing**: Token bucket rate limiter using governor
//! - **Raw Dumps**: Best-effort copy of response bodies to disk
//! - **Injectable Sleep**: Backoff waits go through [`Sleeper`]

mod client;
mod rate_limit;
mod sleeper;

pub use client::{ApiResponse, HttpClient, HttpClientConfig, RequestConfig, RetryPolicy};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
