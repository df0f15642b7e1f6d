//! Heuristic direction classifier

use super::types::{ClassifierConfig, DirectionClassifier};
use crate::types::{Direction, Message, Thread};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Anything but ASCII digits, stripped before comparing phone numbers
static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").unwrap());

/// Digits compared when matching phone numbers (drops country prefixes)
const PHONE_DIGITS: usize = 10;

/// Priority-ordered heuristics:
/// explicit flag, our number, direction/type vocabulary, then body text.
/// Anything that matches nothing is treated as inbound.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    config: ClassifierConfig,
    our_number: Option<String>,
    signatures: Vec<String>,
    phrases: Vec<String>,
    greeting: Option<Regex>,
}

impl HeuristicClassifier {
    /// Build a classifier from configuration
    pub fn new(config: ClassifierConfig) -> Self {
        let our_number = config
            .our_number
            .as_deref()
            .map(normalize_number)
            .filter(|n| !n.is_empty());
        let signatures = lowercase_all(&config.agent_signatures);
        let phrases = lowercase_all(&config.outbound_phrases);
        let greeting = build_greeting_regex(&config.greetings);

        Self {
            config,
            our_number,
            signatures,
            phrases,
            greeting,
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn by_number(&self, message: &Message) -> Option<Direction> {
        let ours = self.our_number.as_deref()?;
        let matches =
            |n: &Option<String>| n.as_deref().map(normalize_number).as_deref() == Some(ours);
        if matches(&message.from_number) {
            Some(Direction::Outbound)
        } else if matches(&message.to_number) {
            Some(Direction::Inbound)
        } else {
            None
        }
    }

    fn by_vocabulary(&self, message: &Message) -> Option<Direction> {
        let hints = &message.hints;
        let fields = [hints.direction.as_deref(), hints.kind.as_deref()];
        let contains =
            |vocab: &[String], value: &str| vocab.iter().any(|v| v.eq_ignore_ascii_case(value));

        for value in fields.into_iter().flatten() {
            if contains(&self.config.outbound_values, value) {
                return Some(Direction::Outbound);
            }
            if contains(&self.config.inbound_values, value) {
                return Some(Direction::Inbound);
            }
        }
        None
    }

    fn by_text(&self, message: &Message, thread: &Thread) -> Option<Direction> {
        if !self.config.lexical {
            return None;
        }
        let body = message.body.to_lowercase();

        if self.signatures.iter().any(|s| body.contains(s.as_str())) {
            debug!("message {}: agent signature", message.id);
            return Some(Direction::Outbound);
        }
        if self.phrases.iter().any(|p| body.contains(p.as_str())) {
            debug!("message {}: outbound phrase", message.id);
            return Some(Direction::Outbound);
        }
        if let (Some(first), Some(re)) = (thread.first_name(), &self.greeting) {
            let greeted = re
                .captures(&body)
                .and_then(|c| c.get(1))
                .is_some_and(|name| name.as_str() == first);
            if greeted {
                debug!("message {}: greets contact by name", message.id);
                return Some(Direction::Outbound);
            }
        }
        None
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl DirectionClassifier for HeuristicClassifier {
    fn classify(&self, message: &Message, thread: &Thread) -> Direction {
        if let Some(inbound) = message.hints.inbound {
            return if inbound {
                Direction::Inbound
            } else {
                Direction::Outbound
            };
        }

        self.by_number(message)
            .or_else(|| self.by_vocabulary(message))
            .or_else(|| self.by_text(message, thread))
            .unwrap_or(Direction::Inbound)
    }
}

/// Leaves every message unclassified
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughClassifier;

impl DirectionClassifier for PassthroughClassifier {
    fn classify(&self, _message: &Message, _thread: &Thread) -> Direction {
        Direction::Unknown
    }
}

fn normalize_number(raw: &str) -> String {
    let digits = NON_DIGITS.replace_all(raw, "");
    let start = digits.len().saturating_sub(PHONE_DIGITS);
    digits[start..].to_string()
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// `^<greeting>[ ,]+<word>` with the word captured
fn build_greeting_regex(greetings: &[String]) -> Option<Regex> {
    let words: Vec<String> = greetings
        .iter()
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .map(|g| regex::escape(&g))
        .collect();
    if words.is_empty() {
        return None;
    }
    Regex::new(&format!(r"^\s*(?:{})[\s,]+([\p{{L}}'-]+)", words.join("|"))).ok()
}
