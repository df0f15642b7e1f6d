//! Todoist request and response types

use crate::types::{Message, Thread};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task content is cut to this many characters
pub const MAX_CONTENT_CHARS: usize = 990;

/// A task to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl NewTask {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            project_id: None,
            section_id: None,
        }
    }

    /// Task for one SMS
    pub fn for_message(message: &Message, thread: &Thread) -> Self {
        Self::new(task_content(message, thread))
    }

    #[must_use]
    pub fn in_project(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id;
        self
    }

    #[must_use]
    pub fn in_section(mut self, section_id: Option<String>) -> Self {
        self.section_id = section_id;
        self
    }
}

/// `SMS on {date} from {sender} ({contact}): {body}`, cut to [`MAX_CONTENT_CHARS`]
pub fn task_content(message: &Message, thread: &Thread) -> String {
    let content = format!(
        "SMS on {} from {} ({}): {}",
        message.date_label(),
        message.sender,
        thread.contact_name,
        message.body
    );
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => content[..cut].to_string(),
        None => content,
    }
}

/// A project section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: Option<i64>,
}

/// Result of one `item_add` command in a sync batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub uuid: String,
    pub ok: bool,
    /// Real id of the created task, from `temp_id_mapping`
    pub task_id: Option<String>,
    pub error: Option<String>,
}

/// Body of a sync response; only the parts we read
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SyncResponse {
    #[serde(default)]
    pub sync_status: serde_json::Map<String, Value>,
    #[serde(default)]
    pub temp_id_mapping: serde_json::Map<String, Value>,
}

impl SyncResponse {
    /// Outcome of the command sent with `uuid` / `temp_id`
    pub(crate) fn outcome(&self, uuid: &str, temp_id: &str) -> CommandOutcome {
        let (ok, error) = match self.sync_status.get(uuid) {
            Some(Value::String(s)) if s == "ok" => (true, None),
            Some(Value::Object(obj)) => (
                false,
                Some(
                    obj.get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                ),
            ),
            Some(other) => (false, Some(other.to_string())),
            None => (false, Some("no status returned".to_string())),
        };
        let task_id = self.temp_id_mapping.get(temp_id).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        CommandOutcome {
            uuid: uuid.to_string(),
            ok,
            task_id,
            error,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}
