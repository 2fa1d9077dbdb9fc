//! Content-addressed cache of normalized analysis results.
//!
//! Entries are keyed by image fingerprint under a schema-versioned
//! namespace prefix. Caching is strictly best-effort: a read or write
//! failure degrades to a remote call, never to an error for the caller.
//!
//! # Quota policy
//!
//! On a quota-exceeded write the cache deletes **every** key under its
//! namespace prefix and retries the write exactly once. Full-namespace
//! eviction is deliberate — results are cheap to regenerate from the
//! remote service, so a simple sweep beats LRU bookkeeping here.
//!
//! # Versioning
//!
//! [`SCHEMA_VERSION`] must be incremented whenever the serialized
//! [`AnalysisResult`] shape changes (field added, removed, or retyped).
//! The version is baked into the namespace prefix, so entries written by
//! an older shape are simply never read again; there is no migration path
//! and no TTL.

use std::sync::Arc;

use chrono::Utc;

use crate::models::{AnalysisResult, CacheEntry};
use crate::store::{Store, StoreError};

/// Version of the serialized [`AnalysisResult`] shape.
pub const SCHEMA_VERSION: u32 = 7;

/// The key prefix for the current schema version.
pub fn namespace_prefix() -> String {
    format!("meal_scan_v{SCHEMA_VERSION}_")
}

/// Quota-aware, namespaced result cache over a [`Store`].
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn Store>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn key(fingerprint: &str) -> String {
        format!("{}{}", namespace_prefix(), fingerprint)
    }

    /// Look up the cached result for a fingerprint.
    ///
    /// A corrupt stored value is discarded and reported as a miss.
    pub async fn get(&self, fingerprint: &str) -> Option<AnalysisResult> {
        let key = Self::key(fingerprint);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::debug!(%err, "cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry.data),
            Err(err) => {
                tracing::debug!(%err, key, "discarding corrupt cache entry");
                let _ = self.store.delete(&key).await;
                None
            }
        }
    }

    /// Store a normalized result under a fingerprint. Best-effort; never
    /// fails the caller.
    pub async fn put(&self, fingerprint: &str, result: &AnalysisResult) {
        let key = Self::key(fingerprint);
        let entry = CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            data: result.clone(),
        };
        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(%err, "cache entry serialization failed");
                return;
            }
        };

        match self.store.set(&key, &payload).await {
            Ok(()) => {}
            Err(StoreError::QuotaExceeded) => {
                let evicted = self.evict_namespace().await;
                tracing::warn!(evicted, "cache quota exceeded; evicted namespace");
                if let Err(err) = self.store.set(&key, &payload).await {
                    tracing::warn!(%err, "cache write abandoned after eviction");
                }
            }
            Err(err) => {
                tracing::debug!(%err, "cache write failed");
            }
        }
    }

    /// Delete every entry in the current namespace. Returns how many keys
    /// were swept.
    pub async fn clear(&self) -> usize {
        self.evict_namespace().await
    }

    /// Number of entries in the current namespace.
    pub async fn entry_count(&self) -> usize {
        self.store
            .list_keys(&namespace_prefix())
            .await
            .map(|keys| keys.len())
            .unwrap_or(0)
    }

    async fn evict_namespace(&self) -> usize {
        let keys = match self.store.list_keys(&namespace_prefix()).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::debug!(%err, "namespace enumeration failed during eviction");
                return 0;
            }
        };
        let mut evicted = 0;
        for key in keys {
            if self.store.delete(&key).await.is_ok() {
                evicted += 1;
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodItem, LocalizedText};
    use crate::store::memory::MemoryStore;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            items: vec![FoodItem {
                name: LocalizedText::from_en("Rice"),
                portion: LocalizedText::from_en("1 bowl"),
                calories: 200.0,
                protein: 4.0,
                carbs: 45.0,
                fats: 0.5,
                ..FoodItem::default()
            }],
            total_calories: 200.0,
            total_protein: 4.0,
            total_carbs: 45.0,
            total_fats: 0.5,
            health_rating: 6.0,
            advice: LocalizedText::from_en("Add some dal for protein."),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        let result = sample_result();
        cache.put("abc123", &result).await;
        assert_eq!(cache.get("abc123").await, Some(result));
    }

    #[tokio::test]
    async fn unknown_fingerprint_is_a_miss() {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss_and_gets_discarded() {
        let store = Arc::new(MemoryStore::new());
        let key = format!("{}deadbeef", namespace_prefix());
        store.set(&key, "{not json").await.unwrap();

        let cache = ResultCache::new(store.clone());
        assert_eq!(cache.get("deadbeef").await, None);
        assert_eq!(store.get(&key).await.unwrap(), None, "corrupt entry removed");
    }

    #[tokio::test]
    async fn entry_under_older_schema_prefix_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        let entry = CacheEntry {
            timestamp: 0,
            data: sample_result(),
        };
        let old_key = format!("meal_scan_v{}_abc123", SCHEMA_VERSION - 1);
        store
            .set(&old_key, &serde_json::to_string(&entry).unwrap())
            .await
            .unwrap();

        let cache = ResultCache::new(store);
        assert_eq!(cache.get("abc123").await, None);
    }

    #[tokio::test]
    async fn quota_pressure_evicts_namespace_and_retries_once() {
        // Large enough for one entry but not two.
        let payload_size = serde_json::to_string(&CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            data: sample_result(),
        })
        .unwrap()
        .len();
        let store = Arc::new(MemoryStore::with_quota(payload_size + 128));
        let cache = ResultCache::new(store.clone());

        cache.put("first00", &sample_result()).await;
        assert!(cache.get("first00").await.is_some());

        // Second write trips the quota, sweeps the namespace, and lands on
        // the retry.
        cache.put("second0", &sample_result()).await;
        assert_eq!(cache.get("first00").await, None, "old entry evicted");
        assert!(cache.get("second0").await.is_some(), "retried write succeeded");
    }

    #[tokio::test]
    async fn eviction_leaves_foreign_keys_alone() {
        let store = Arc::new(MemoryStore::new());
        store.set("unrelated_key", "kept").await.unwrap();

        let cache = ResultCache::new(store.clone());
        cache.put("abc123", &sample_result()).await;
        assert_eq!(cache.clear().await, 1);

        assert_eq!(cache.entry_count().await, 0);
        assert_eq!(store.get("unrelated_key").await.unwrap(), Some("kept".into()));
    }

    #[tokio::test]
    async fn fingerprint_collision_overwrites_silently() {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        let mut second = sample_result();
        second.health_rating = 2.0;

        cache.put("abc123", &sample_result()).await;
        cache.put("abc123", &second).await;
        assert_eq!(cache.get("abc123").await, Some(second));
    }
}
