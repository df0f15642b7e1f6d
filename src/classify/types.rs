//! Classifier trait and configuration

use crate::error::{Error, Result, ResultExt};
use crate::types::{Direction, Message, Thread};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decides the direction of a message
pub trait DirectionClassifier: Send + Sync {
    /// Classify `message`, which belongs to `thread`
    fn classify(&self, message: &Message, thread: &Thread) -> Direction;
}

/// Tenant-specific classification data.
///
/// Loaded from YAML; every field is optional in the file.
///
/// ```yaml
/// our_number: "+1 555 010 0000"
/// agent_signatures: ["- jane", "acme insurance"]
/// outbound_phrases: ["our office", "call our office"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// The agency's own phone number
    pub our_number: Option<String>,
    /// `direction`/`type` values meaning the agency sent the message
    pub outbound_values: Vec<String>,
    /// `direction`/`type` values meaning the contact sent the message
    pub inbound_values: Vec<String>,
    /// Agent names or sign-offs found in outbound bodies
    pub agent_signatures: Vec<String>,
    /// Phrases only the agency writes
    pub outbound_phrases: Vec<String>,
    /// Words that, followed by the contact's first name, open an outbound text
    pub greetings: Vec<String>,
    /// Use body text heuristics at all
    pub lexical: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            our_number: None,
            outbound_values: to_strings(&["outbound", "out", "sent", "send"]),
            inbound_values: to_strings(&["inbound", "in", "received", "receive", "incoming"]),
            agent_signatures: Vec::new(),
            outbound_phrases: Vec::new(),
            greetings: to_strings(&["hey", "hi", "hello"]),
            lexical: true,
        }
    }
}

impl ClassifierConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read classifier file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid classifier file {}", path.display()))
    }

    /// Set the agency number
    #[must_use]
    pub fn with_our_number(mut self, number: Option<String>) -> Self {
        if number.is_some() {
            self.our_number = number;
        }
        self
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
