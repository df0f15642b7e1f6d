//! Plain-text export

use super::write_file;
use crate::error::Result;
use crate::types::Conversation;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

const RULE_WIDTH: usize = 80;

/// Render every message of `conversations` as a numbered text report
pub fn render_text_export(conversations: &[Conversation], generated: DateTime<Utc>) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let total: usize = conversations.iter().map(|c| c.messages.len()).sum();

    let mut out = String::new();
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "SMS MESSAGES EXPORT");
    let _ = writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Total Messages: {total}");
    let _ = writeln!(out, "{heavy}\n");

    let messages = conversations
        .iter()
        .flat_map(|c| c.messages.iter().map(move |m| (&c.thread, m)));
    for (index, (thread, message)) in messages.enumerate() {
        let _ = writeln!(out, "MESSAGE #{}", index + 1);
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "Date:      {}", message.date_label());
        let _ = writeln!(out, "From:      {}", message.sender);
        let _ = writeln!(out, "Contact:   {}", thread.contact_name);
        let _ = writeln!(
            out,
            "Phone:     {}",
            thread.phone_number.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "Direction: {}", message.direction);
        let _ = writeln!(out, "ID:        {}", message.id);
        let _ = writeln!(out, "\nMessage:\n{}", message.body);
        let _ = writeln!(out, "\n{heavy}\n");
    }
    out
}

/// Write the text export; returns the number of messages written.
///
/// Nothing is written when there are no messages.
pub async fn write_text_export(path: &Path, conversations: &[Conversation]) -> Result<usize> {
    let total: usize = conversations.iter().map(|c| c.messages.len()).sum();
    if total == 0 {
        return Ok(0);
    }
    write_file(path, &render_text_export(conversations, Utc::now())).await?;
    info!("Exported {total} messages to {}", path.display());
    Ok(total)
}
