//! State management module
//!
//! Tracks which messages earlier runs already handled so a re-run does not
//! create duplicate tasks. State is persisted between runs as a small JSON
//! file.
//!
//! # Overview
//!
//! The state module provides:
//! - `SeenCache` - Set of processed message ids with file persistence
//! - `CacheFile` - On-disk document shape

mod cache;
mod types;

pub use cache::SeenCache;
pub use types::CacheFile;

#[cfg(test)]
mod cache_tests;
