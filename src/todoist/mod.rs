//! Todoist integration
//!
//! Creates one task per relayed message, either through the REST endpoint
//! (one request per task) or through the sync endpoint in batches.

mod client;
mod types;

pub use client::{TodoistClient, SECTIONS_PATH, SYNC_BATCH_SIZE, SYNC_PATH, TASKS_PATH};
pub use types::{task_content, CommandOutcome, NewTask, Section, MAX_CONTENT_CHARS};

#[cfg(test)]
mod tests;
