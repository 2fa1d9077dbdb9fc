//! In-memory [`Store`] implementation for tests and no-persistence use.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. The
//! optional quota counts key plus value lengths in bytes, which mirrors
//! how browser-style storage accounts usage and lets tests drive the
//! quota-eviction path deterministically.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Store, StoreError};

/// In-memory store with an optional byte quota.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    max_bytes: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_bytes: None,
        }
    }

    /// Store that rejects writes once `max_bytes` of keys plus values
    /// would be exceeded.
    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_bytes: Some(max_bytes),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        if let Some(max) = self.max_bytes {
            let usage: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if usage + key.len() + value.len() > max {
                return Err(StoreError::QuotaExceeded);
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().unwrap();
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let store = MemoryStore::new();
        store.set("k1", "v1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("v1".to_string()));

        store.delete("k1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);

        // Deleting an absent key is a no-op.
        store.delete("k1").await.unwrap();
    }

    #[tokio::test]
    async fn list_keys_filters_by_prefix() {
        let store = MemoryStore::new();
        store.set("scan_a", "1").await.unwrap();
        store.set("scan_b", "2").await.unwrap();
        store.set("other_c", "3").await.unwrap();

        let keys = store.list_keys("scan_").await.unwrap();
        assert_eq!(keys, vec!["scan_a", "scan_b"]);
    }

    #[tokio::test]
    async fn quota_rejects_writes_that_do_not_fit() {
        let store = MemoryStore::with_quota(16);
        store.set("key1", "12345678").await.unwrap(); // 12 bytes

        let err = store.set("key2", "12345678").await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded));

        // The first entry is untouched.
        assert_eq!(store.get("key1").await.unwrap(), Some("12345678".into()));
    }

    #[tokio::test]
    async fn replacing_a_key_accounts_for_the_freed_bytes() {
        let store = MemoryStore::with_quota(16);
        store.set("key1", "12345678").await.unwrap();
        // Replacement is measured against usage minus the old entry.
        store.set("key1", "abcdefgh").await.unwrap();
        assert_eq!(store.get("key1").await.unwrap(), Some("abcdefgh".into()));
    }
}
