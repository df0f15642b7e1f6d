// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # AgencyZoom SMS Bridge
//!
//! Fetches SMS conversations from the AgencyZoom CRM, exports them to local
//! files, and relays new inbound messages to Todoist as tasks.
//!
//! ## Features
//!
//! - **Resilient Pagination**: Walks page-numbered list endpoints, logging in
//!   again once on 401/403 and backing off on 429
//! - **Direction Inference**: Configurable heuristics decide whether a message
//!   came from the contact or from the agency
//! - **Idempotent Relay**: A seen-message cache keeps reruns from creating
//!   duplicate tasks
//! - **Exports**: Text report, JSON records, a raw debug dump and an endpoint probe
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use az_sms_bridge::agencyzoom::AgencyZoomClient;
//! use az_sms_bridge::config::Config;
//! use az_sms_bridge::engine::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> az_sms_bridge::Result<()> {
//!     let config = Config::from_env()?;
//!     let agencyzoom = AgencyZoomClient::from_config(&config.agencyzoom, None)?;
//!     let pipeline = Pipeline::new(config, agencyzoom);
//!
//!     let mut session = pipeline.session()?;
//!     let stats = pipeline.export(&mut session).await?;
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         CLI / Runner                            │
//! │        relay    export    dump    probe    sections             │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴──────────────────────────────────┐
//! │                     Pipeline (engine)                           │
//! │  fetch → classify → filter (seen, since, inbound) → deliver     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │ Classify  │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Login    │ GET/POST  │ Page Number   │ Flags     │ Text        │
//! │ Bearer   │ 429 Retry │ Re-auth once  │ Numbers   │ JSON        │
//! │ Refresh  │ Pacing    │ Item limits   │ Lexical   │ Debug dump  │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Threads, messages and field lookup helpers
pub mod types;

/// AgencyZoom login and session
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Page-numbered list fetching
pub mod pagination;

/// AgencyZoom text-thread API
pub mod agencyzoom;

/// Message direction inference
pub mod classify;

/// Todoist task creation
pub mod todoist;

/// Seen-message cache
pub mod state;

/// Text, JSON and debug dump files
pub mod output;

/// Run pipeline
pub mod engine;

/// Environment configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
