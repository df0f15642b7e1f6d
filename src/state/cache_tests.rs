//! Tests for SeenCache

use super::*;
use tempfile::tempdir;

// ============================================================================
// Load Tests
// ============================================================================

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let cache = SeenCache::load(dir.path().join("nope.json"));
    assert!(cache.is_empty());
}

#[test]
fn test_load_corrupt_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{not json").unwrap();

    let cache = SeenCache::load(&path);
    assert!(cache.is_empty());
}

#[test]
fn test_load_wrong_shape_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "[\"1\", \"2\"]").unwrap();

    assert!(SeenCache::load(&path).is_empty());
}

#[test]
fn test_load_stringifies_numeric_ids() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, r#"{"seen_message_ids": ["a", 42, null]}"#).unwrap();

    let cache = SeenCache::load(&path);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("a"));
    assert!(cache.contains("42"));
}

// ============================================================================
// Membership Tests
// ============================================================================

#[test]
fn test_insert_and_contains() {
    let mut cache = SeenCache::new("/tmp/unused.json");
    assert!(cache.insert("m1"));
    assert!(!cache.insert("m1"));
    assert!(cache.contains("m1"));
    assert!(!cache.contains("m2"));
    assert_eq!(cache.len(), 1);
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.json");

    let mut cache = SeenCache::new(&path);
    cache.insert("b");
    cache.insert("a");
    cache.save().await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let doc: CacheFile = serde_json::from_str(&contents).unwrap();
    assert_eq!(doc.seen_message_ids, vec!["a", "b"]);

    let reloaded = SeenCache::load(&path);
    assert_eq!(reloaded.ids(), cache.ids());
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_save_failure_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();

    let mut cache = SeenCache::new(blocker.join("cache.json"));
    cache.insert("m1");

    let err = cache.save().await.unwrap_err();
    assert!(!err.is_fatal());
    assert!(!cache.save_or_warn().await);
}
