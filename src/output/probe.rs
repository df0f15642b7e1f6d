//! Endpoint probe report
//!
//! Raw responses of the text-thread endpoints plus a short summary, for
//! checking what a tenant's API actually exposes.

use super::write_file;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything gathered by a probe run
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Raw thread list items
    pub threads: Vec<Value>,
    /// Raw messages of each sampled thread
    pub details: BTreeMap<String, Vec<Value>>,
    /// Producer response, or an [`endpoint_failure`] document
    pub producer: Value,
    /// Unread-thread response, or an [`endpoint_failure`] document
    pub unread: Value,
    pub summary: ProbeSummary,
}

/// Contents of `_summary.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeSummary {
    pub base: String,
    pub threads_found: usize,
    pub thread_ids_sampled: Vec<String>,
    pub details_sampled: usize,
    pub has_producer_data: bool,
    pub has_unread_data: bool,
}

/// Document recorded in place of a response when an optional endpoint fails
pub fn endpoint_failure(error: &Error) -> Value {
    let status = match error {
        Error::HttpStatus { status, .. } => Some(*status),
        _ => None,
    };
    json!({ "error": error.to_string(), "status": status })
}

/// Whether `value` is a real response rather than an [`endpoint_failure`]
pub fn has_data(value: &Value) -> bool {
    value.get("error").is_none()
}

/// Write the probe files under `dir`; returns the paths written
pub async fn write_probe(dir: &Path, report: &ProbeReport) -> Result<Vec<PathBuf>> {
    let files: [(&str, Value); 5] = [
        ("list_threads.json", json!(report.threads)),
        ("details_by_thread.json", json!(report.details)),
        ("producer.json", report.producer.clone()),
        ("unread_thread.json", report.unread.clone()),
        ("_summary.json", json!(report.summary)),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, value) in files {
        let contents = serde_json::to_string_pretty(&value)
            .map_err(|e| Error::output(format!("Failed to serialize {name}: {e}")))?;
        let path = dir.join(name);
        write_file(&path, &contents).await?;
        written.push(path);
    }

    info!(
        "Probe: {} threads, {} sampled, written to {}",
        report.summary.threads_found,
        report.summary.details_sampled,
        dir.display()
    );
    Ok(written)
}
