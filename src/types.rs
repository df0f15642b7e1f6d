//! Common types used throughout az-sms-bridge
//!
//! Threads and messages are built from the loosely-shaped JSON objects the
//! AgencyZoom API returns. Field names drift between endpoints and tenants, so
//! every field is looked up through a list of known aliases.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Field lookup
// ============================================================================

/// First alias holding a non-empty string or a number, rendered as a string
pub fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First alias holding a boolean
pub fn first_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| value.get(*key)?.as_bool())
}

/// Parse an AgencyZoom timestamp.
///
/// Accepts RFC 3339 (`2023-10-08T16:14:23.123Z`, `...+02:00`) and naive
/// ISO-8601 values, which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Direction
// ============================================================================

/// Direction of a text message relative to the agency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the contact to the agency
    Inbound,
    /// Sent by the agency to the contact
    Outbound,
    /// Not classified
    #[default]
    Unknown,
}

impl Direction {
    /// Lowercase label used in exports
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
            Direction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction signals carried by the raw message payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionHints {
    /// Explicit inbound flag (`inbound`, `incoming`, `fromCustomer`, or inverted `outbound`)
    pub inbound: Option<bool>,
    /// Lowercased `direction` / `fromRole` field
    pub direction: Option<String>,
    /// Lowercased `type` field
    pub kind: Option<String>,
}

impl DirectionHints {
    fn from_value(value: &Value) -> Self {
        let inbound = first_bool(value, &["inbound", "incoming", "fromCustomer"])
            .or_else(|| first_bool(value, &["outbound"]).map(|out| !out));
        Self {
            inbound,
            direction: first_string(value, &["direction", "fromRole"]).map(|s| s.to_lowercase()),
            kind: first_string(value, &["type"]).map(|s| s.to_lowercase()),
        }
    }
}

// ============================================================================
// Thread
// ============================================================================

/// A CRM conversation with one contact
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub id: String,
    pub contact_name: String,
    pub phone_number: Option<String>,
    pub last_message_raw: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Raw API object
    pub raw: Value,
}

impl Thread {
    /// Build a thread from an API item. Returns `None` when the item has no id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = first_string(value, &["id", "threadId"])?;
        let last_message_raw =
            first_string(value, &["lastMessageDate", "lastDateUTC", "lastMessageDateUTC"]);
        Some(Self {
            id,
            contact_name: first_string(value, &["contactName", "leadName", "customerName"])
                .unwrap_or_else(|| "Unknown".to_string()),
            phone_number: first_string(value, &["phoneNumber", "phone", "contactPhone"]),
            last_message_at: last_message_raw.as_deref().and_then(parse_timestamp),
            last_message_raw,
            raw: value.clone(),
        })
    }

    /// Lowercased first name of the contact, if known
    pub fn first_name(&self) -> Option<String> {
        if self.contact_name == "Unknown" {
            return None;
        }
        self.contact_name
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
    }
}

// ============================================================================
// Message
// ============================================================================

/// A single SMS inside a thread
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub body: String,
    pub sender: String,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub sent_raw: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub hints: DirectionHints,
    /// Filled in by a [`crate::classify::DirectionClassifier`]
    pub direction: Direction,
    /// Raw API object
    pub raw: Value,
}

impl Message {
    /// Build a message from an API item. Returns `None` when the item has no id.
    pub fn from_value(thread_id: &str, value: &Value) -> Option<Self> {
        let id = first_string(value, &["id", "messageId"])?;
        let sent_raw = first_string(
            value,
            &["messageDate", "sentDate", "sentAt", "createdAt", "dateUtc", "date"],
        );
        Some(Self {
            id,
            thread_id: thread_id.to_string(),
            body: first_string(value, &["body", "message", "text"]).unwrap_or_default(),
            sender: first_string(value, &["senderName", "fromName"])
                .unwrap_or_else(|| "Unknown".to_string()),
            from_number: first_string(value, &["fromNumber", "fromPhone", "from"]),
            to_number: first_string(value, &["toNumber", "toPhone", "to"]),
            sent_at: sent_raw.as_deref().and_then(parse_timestamp),
            sent_raw,
            hints: DirectionHints::from_value(value),
            direction: Direction::Unknown,
            raw: value.clone(),
        })
    }

    /// Timestamp label used in task content and text exports
    pub fn date_label(&self) -> &str {
        self.sent_raw.as_deref().unwrap_or("unknown date")
    }
}

/// A thread together with its fetched messages
#[derive(Debug, Clone)]
pub struct Conversation {
    pub thread: Thread,
    pub messages: Vec<Message>,
}
