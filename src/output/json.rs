//! JSON export

use super::write_file;
use crate::error::{Error, Result};
use crate::types::{Conversation, Direction, Message, Thread};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One exported message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub message_id: String,
    pub direction: Direction,
    pub from: String,
    pub to: String,
    pub message_body: String,
    /// Raw timestamp as sent by the API
    pub timestamp: Option<String>,
}

impl ExportRecord {
    /// Build a record, filling missing numbers from the thread and `our_number`
    pub fn from_message(message: &Message, thread: &Thread, our_number: Option<&str>) -> Self {
        let contact = || {
            thread
                .phone_number
                .clone()
                .unwrap_or_else(|| thread.contact_name.clone())
        };
        let ours = || our_number.map(str::to_string);

        let (from, to) = match message.direction {
            Direction::Outbound => (
                message
                    .from_number
                    .clone()
                    .or_else(ours)
                    .unwrap_or_else(|| message.sender.clone()),
                message.to_number.clone().unwrap_or_else(contact),
            ),
            Direction::Inbound | Direction::Unknown => (
                message.from_number.clone().unwrap_or_else(contact),
                message.to_number.clone().or_else(ours).unwrap_or_default(),
            ),
        };

        Self {
            message_id: message.id.clone(),
            direction: message.direction,
            from,
            to,
            message_body: message.body.clone(),
            timestamp: message.sent_raw.clone(),
        }
    }
}

/// Write every message as a pretty JSON array; returns the record count
pub async fn write_json_export(
    path: &Path,
    conversations: &[Conversation],
    our_number: Option<&str>,
) -> Result<usize> {
    let records: Vec<ExportRecord> = conversations
        .iter()
        .flat_map(|c| {
            c.messages
                .iter()
                .map(|m| ExportRecord::from_message(m, &c.thread, our_number))
        })
        .collect();

    let contents = serde_json::to_string_pretty(&records)
        .map_err(|e| Error::output(format!("Failed to serialize JSON export: {e}")))?;
    write_file(path, &contents).await?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(records.len())
}

/// Read a file written by [`write_json_export`]
pub async fn read_json_export(path: &Path) -> Result<Vec<ExportRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::output(format!("Failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&contents)?)
}
