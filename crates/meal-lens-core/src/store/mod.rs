//! Storage abstraction for the result cache.
//!
//! The [`Store`] trait is a minimal key/value capability — get, set,
//! delete, and key enumeration — with a quota failure the cache layer can
//! distinguish from everything else. Backends never leak their own error
//! shapes; they map everything that is not quota pressure to
//! [`StoreError::Backend`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

/// Errors a storage backend may report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would exceed the backend's storage quota. The cache layer
    /// reacts to this specifically (namespace eviction plus one retry).
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// Any other backend failure. The cache layer treats these as misses
    /// or abandoned writes; they never propagate to callers.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Abstract key/value store shared by all analysis calls.
///
/// Writes are whole-entry replacements, so no locking discipline beyond
/// the backend's own is needed; concurrent namespace sweeps are idempotent
/// (deleting an already-deleted key is a no-op).
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the value for a key, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any existing one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every stored key beginning with `prefix`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
