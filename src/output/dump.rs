//! Debug dump
//!
//! Writes what the API returned, nearly untouched, so field names and shapes
//! can be inspected when a tenant's payloads do not parse as expected.

use super::write_file;
use crate::error::{Error, Result};
use crate::types::{first_string, Direction, Message, Thread};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// One message with its thread, as written to `messages.json`
#[derive(Debug, Clone, Serialize)]
pub struct DumpRecord {
    pub thread_id: String,
    pub thread: Value,
    pub message: Value,
    pub thread_contact: Option<String>,
    /// `direction` / `fromRole` exactly as the API sent it
    pub direction: Option<String>,
    /// What the classifier made of the message
    pub inferred_direction: Direction,
    pub sent_at: Option<String>,
    #[serde(skip)]
    sort_key: Option<chrono::DateTime<chrono::Utc>>,
}

impl DumpRecord {
    pub fn new(thread: &Thread, message: &Message) -> Self {
        Self {
            thread_id: thread.id.clone(),
            thread: thread.raw.clone(),
            message: message.raw.clone(),
            thread_contact: first_string(&thread.raw, &["contactName", "leadName", "customerName"]),
            direction: first_string(&message.raw, &["direction", "fromRole"]),
            inferred_direction: message.direction,
            sent_at: message.sent_raw.clone(),
            sort_key: message.sent_at,
        }
    }

    /// Minimal per-message view keyed by thread, as written to `chat_refs_debug.jsonl`
    pub fn chat_ref(&self) -> ChatRef<'_> {
        let lead = self
            .thread_contact
            .clone()
            .or_else(|| first_string(&self.message, &["fromName", "senderName"]))
            .unwrap_or_else(|| "Unknown".to_string());
        ChatRef {
            thread_id: &self.thread_id,
            chat_ref: &self.thread_id,
            lead,
            sent_at: self.sent_at.as_deref(),
            direction: self.direction.as_deref(),
            message: first_string(&self.message, &["body", "message", "text"]).unwrap_or_default(),
        }
    }
}

/// One line of `chat_refs_debug.jsonl`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRef<'a> {
    pub thread_id: &'a str,
    pub chat_ref: &'a str,
    pub lead: String,
    pub sent_at: Option<&'a str>,
    pub direction: Option<&'a str>,
    pub message: String,
}

/// Values recorded in `_run.log`
#[derive(Debug, Clone, Default)]
pub struct DumpSummary {
    pub mode: String,
    pub last_date_utc: Option<String>,
    pub total_limit: Option<usize>,
    pub thread_limit: Option<usize>,
    pub messages_per_thread_limit: Option<usize>,
}

/// Keep the newest `limit` records, newest first. Undated records sort last.
pub fn trim_newest(mut records: Vec<DumpRecord>, limit: Option<usize>) -> Vec<DumpRecord> {
    let Some(limit) = limit else {
        return records;
    };
    records.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    records.truncate(limit);
    records
}

/// Sorted union of the top-level keys of every object in `values`
pub fn collect_keys<'a>(values: impl IntoIterator<Item = &'a Value>) -> BTreeSet<String> {
    values
        .into_iter()
        .filter_map(Value::as_object)
        .flat_map(|obj| obj.keys().cloned())
        .collect()
}

/// Write the dump files under `dir`; returns the paths written
pub async fn write_dump(
    dir: &Path,
    threads: &[Thread],
    records: &[DumpRecord],
    summary: &DumpSummary,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let raw_threads: Vec<&Value> = threads.iter().map(|t| &t.raw).collect();
    let path = dir.join("threads.json");
    write_file(&path, &to_pretty(&raw_threads)?).await?;
    written.push(path);

    let path = dir.join("messages.json");
    write_file(&path, &to_pretty(&records)?).await?;
    written.push(path);

    let path = dir.join("messages.jsonl");
    write_file(&path, &to_lines(records)?).await?;
    written.push(path);

    let chat_refs: Vec<ChatRef<'_>> = records.iter().map(DumpRecord::chat_ref).collect();
    let path = dir.join("chat_refs_debug.jsonl");
    write_file(&path, &to_lines(chat_refs.as_slice())?).await?;
    written.push(path);

    let path = dir.join("_sample_keys.txt");
    write_file(&path, &render_keys(threads, records)).await?;
    written.push(path);

    let path = dir.join("_run.log");
    write_file(&path, &render_run_log(threads.len(), records, summary)).await?;
    written.push(path);

    info!(
        "Dumped {} threads and {} messages to {}",
        threads.len(),
        records.len(),
        dir.display()
    );
    Ok(written)
}

fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::output(format!("Failed to serialize dump: {e}")))
}

fn to_lines<T: Serialize>(items: &[T]) -> Result<String> {
    let mut lines = String::new();
    for item in items {
        let line = serde_json::to_string(item)
            .map_err(|e| Error::output(format!("Failed to serialize dump record: {e}")))?;
        lines.push_str(&line);
        lines.push('\n');
    }
    Ok(lines)
}

fn render_keys(threads: &[Thread], records: &[DumpRecord]) -> String {
    let mut out = String::from("[THREAD KEYS]\n");
    for key in collect_keys(threads.iter().map(|t| &t.raw)) {
        let _ = writeln!(out, "- {key}");
    }
    out.push_str("\n[MESSAGE KEYS]\n");
    for key in collect_keys(records.iter().map(|r| &r.message)) {
        let _ = writeln!(out, "- {key}");
    }
    out
}

fn render_run_log(threads: usize, records: &[DumpRecord], summary: &DumpSummary) -> String {
    let example = records.iter().find_map(|r| r.sent_at.as_deref());
    let limit = |value: Option<usize>| value.map_or_else(|| "none".to_string(), |n| n.to_string());

    let mut out = String::new();
    let _ = writeln!(out, "threads: {threads}");
    let _ = writeln!(out, "messages: {}", records.len());
    let _ = writeln!(out, "example_sent_at: {}", example.unwrap_or("none"));
    let _ = writeln!(out, "mode: {}", summary.mode);
    let _ = writeln!(
        out,
        "lastDateUTC: {}",
        summary.last_date_utc.as_deref().unwrap_or("none")
    );
    let _ = writeln!(out, "TOTAL_LIMIT: {}", limit(summary.total_limit));
    let _ = writeln!(out, "LIMIT_THREADS: {}", limit(summary.thread_limit));
    let _ = writeln!(
        out,
        "LIMIT_MSGS_PER_THREAD: {}",
        limit(summary.messages_per_thread_limit)
    );
    out
}
