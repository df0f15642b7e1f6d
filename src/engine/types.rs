//! Engine types

use crate::types::Conversation;
use serde::Serialize;

/// Messages gathered by a pipeline run, after filtering
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Threads listed
    pub threads: usize,
    /// Conversations holding the messages that passed every filter
    pub conversations: Vec<Conversation>,
    /// Messages dropped by a filter
    pub skipped: usize,
}

impl Collected {
    /// Messages that passed every filter
    pub fn message_count(&self) -> usize {
        self.conversations.iter().map(|c| c.messages.len()).sum()
    }
}

/// Statistics from a relay or export run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Threads listed
    pub threads: usize,
    /// Tasks created in Todoist
    pub created: usize,
    /// Messages dropped by a filter
    pub skipped: usize,
    /// Tasks Todoist rejected; their messages stay unseen
    pub failed: usize,
    /// Ids held by the seen cache at the end of the run
    pub cached: usize,
    /// Messages written to the text/JSON exports
    pub exported: usize,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "threads={}, created={}, skipped={}, failed={}, cached_ids={}, exported={}",
            self.threads, self.created, self.skipped, self.failed, self.cached, self.exported
        )
    }
}
