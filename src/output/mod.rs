//! Output module
//!
//! Local files written by a run.
//!
//! # Overview
//!
//! - Human-readable text export of the relayed messages
//! - JSON export of [`ExportRecord`]s, readable back with [`read_json_export`]
//! - Debug dump of raw threads and messages plus a key inventory
//! - Probe report of the optional text-thread endpoints
//!
//! Every writer here reports failures as [`crate::Error::Output`], which
//! callers treat as non-fatal.

mod dump;
mod json;
mod probe;
mod text;

pub use dump::{collect_keys, trim_newest, write_dump, ChatRef, DumpRecord, DumpSummary};
pub use json::{read_json_export, write_json_export, ExportRecord};
pub use probe::{endpoint_failure, has_data, write_probe, ProbeReport, ProbeSummary};
pub use text::{render_text_export, write_text_export};

use crate::error::{Error, Result};
use std::path::Path;

/// Write `contents` to `path`, creating parent directories
pub(crate) async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            Error::output(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Error::output(format!("Failed to write {}: {e}", path.display())))
}
