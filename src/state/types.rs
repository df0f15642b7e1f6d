//! State types persisted between runs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// On-disk shape of the seen-message cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFile {
    /// Processed message ids, sorted
    #[serde(default)]
    pub seen_message_ids: Vec<String>,
}

impl CacheFile {
    /// Build a sorted, de-duplicated document from a set of ids
    pub fn from_ids(ids: &HashSet<String>) -> Self {
        let mut seen_message_ids: Vec<String> = ids.iter().cloned().collect();
        seen_message_ids.sort();
        Self { seen_message_ids }
    }

    /// Ids as a set
    pub fn into_ids(self) -> HashSet<String> {
        self.seen_message_ids.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ids_is_sorted() {
        let ids: HashSet<String> = ["b", "c", "a"].iter().map(|s| (*s).to_string()).collect();
        let file = CacheFile::from_ids(&ids);
        assert_eq!(file.seen_message_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_field_defaults_to_empty() {
        let file: CacheFile = serde_json::from_str("{}").unwrap();
        assert!(file.seen_message_ids.is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let file = CacheFile {
            seen_message_ids: vec!["1".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({"seen_message_ids": ["1"]})
        );
    }
}
