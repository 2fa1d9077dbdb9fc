//! SQLite-backed [`Store`] implementation.
//!
//! A single `kv` table holds the cache namespace. The optional quota is
//! measured in bytes over stored keys plus values and is checked before
//! every write, so quota pressure surfaces as [`StoreError::QuotaExceeded`]
//! rather than as a backend-specific disk error.

use async_trait::async_trait;
use meal_lens_core::store::{Store, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::StoreConfig;

pub struct SqliteStore {
    pool: SqlitePool,
    max_bytes: Option<u64>,
}

impl SqliteStore {
    /// Open (or create) the store database and ensure the schema exists.
    /// Idempotent.
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        let db_path = &config.path;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            max_bytes: config.max_bytes,
        })
    }

    /// Stored bytes over every entry except `key` (the entry a write would
    /// replace). CAST to BLOB so multibyte text counts bytes, not chars.
    async fn usage_excluding(&self, key: &str) -> Result<u64, StoreError> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))) FROM kv WHERE key <> ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(total.unwrap_or(0).max(0) as u64)
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(max) = self.max_bytes {
            let projected =
                self.usage_excluding(key).await? + (key.len() + value.len()) as u64;
            if projected > max {
                return Err(StoreError::QuotaExceeded);
            }
        }

        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // Filter in Rust: the namespace prefix contains underscores, which
        // are single-character wildcards under SQL LIKE.
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(keys
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store(tmp: &tempfile::TempDir, max_bytes: Option<u64>) -> SqliteStore {
        let config = StoreConfig {
            path: tmp.path().join("data").join("meal.sqlite"),
            max_bytes,
        };
        SqliteStore::connect(&config).await.unwrap()
    }

    #[tokio::test]
    async fn round_trip_and_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(&tmp, None).await;

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v1".into()));

        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".into()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let first = open_store(&tmp, None).await;
        first.set("k", "v").await.unwrap();
        drop(first);

        let second = open_store(&tmp, None).await;
        assert_eq!(second.get("k").await.unwrap(), Some("v".into()));
    }

    #[tokio::test]
    async fn list_keys_ignores_like_wildcard_semantics() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(&tmp, None).await;

        store.set("meal_scan_v7_abc", "1").await.unwrap();
        store.set("mealXscanXv7Xdef", "2").await.unwrap();
        store.set("other", "3").await.unwrap();

        let keys = store.list_keys("meal_scan_v7_").await.unwrap();
        assert_eq!(keys, vec!["meal_scan_v7_abc"]);
    }

    #[tokio::test]
    async fn quota_rejects_oversized_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(&tmp, Some(24)).await;

        store.set("key1", "0123456789").await.unwrap(); // 14 bytes
        let err = store.set("key2", "0123456789").await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded));

        // Replacing the existing entry still fits.
        store.set("key1", "abcdefghij").await.unwrap();
    }
}
