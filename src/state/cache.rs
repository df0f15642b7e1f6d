//! Seen-message cache
//!
//! Provides file-based persistence with atomic writes. Loading never fails:
//! a missing or unreadable cache simply means nothing has been seen yet.

use super::types::CacheFile;
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Processed message ids, persisted between runs
#[derive(Debug, Clone)]
pub struct SeenCache {
    /// Path to the cache file
    path: PathBuf,
    /// Ids known to be processed
    ids: HashSet<String>,
}

impl SeenCache {
    /// Create an empty cache that will be saved to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ids: HashSet::new(),
        }
    }

    /// Load the cache at `path`; a missing or corrupt file yields an empty cache
    pub fn load(path: impl AsRef<Path>) -> Self {
        let mut cache = Self::new(path);
        match std::fs::read_to_string(&cache.path) {
            Ok(contents) => match parse_ids(&contents) {
                Some(ids) => {
                    debug!("Loaded {} seen ids from {}", ids.len(), cache.path.display());
                    cache.ids = ids;
                }
                None => warn!(
                    "Ignoring unreadable cache file {}",
                    cache.path.display()
                ),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to read cache file {}: {e}", cache.path.display()),
        }
        cache
    }

    /// Whether `id` was already processed
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record `id`; returns `true` when it was new
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Number of ids held
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no ids are held
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The ids held
    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    /// The cache file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the cache, via a temp file and rename
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&CacheFile::from_ids(&self.ids))
            .map_err(|e| Error::state(format!("Failed to serialize cache: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::state(format!("Failed to create cache directory: {e}")))?;
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write cache file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename cache file: {e}")))?;

        Ok(())
    }

    /// Save, logging a warning instead of failing. Returns whether it worked.
    pub async fn save_or_warn(&self) -> bool {
        match self.save().await {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }
}

/// Ids from a cache document; numeric ids are stringified
fn parse_ids(contents: &str) -> Option<HashSet<String>> {
    let value: Value = serde_json::from_str(contents).ok()?;
    let Some(list) = value.get("seen_message_ids") else {
        return value.is_object().then(HashSet::new);
    };
    let ids = list
        .as_array()?
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    Some(ids)
}
