use std::collections::HashMap;
use std::sync::Arc;

use semcache_core::{Document, SemcacheError, VectorStore};
use serde_json::Value;
use tokio::sync::Mutex;

/// Metadata attribute holding the provider's answer.
pub const CACHED_RESPONSE_KEY: &str = "cached_response";

/// A key/answer pair waiting to be admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub response: String,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            response: response.into(),
        }
    }
}

/// Result of an admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { flushed: bool },
    Duplicate,
}

/// Capacity-bounded view over a `VectorStore`.
///
/// Reaching `capacity` flushes the whole store before the next entry is
/// indexed. Admission, flush and counting share one lock; lookups bypass it
/// and may observe the store just before or just after a flush.
pub struct BoundedStore {
    store: Arc<dyn VectorStore>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl BoundedStore {
    pub fn new(store: Arc<dyn VectorStore>, capacity: usize) -> Result<Self, SemcacheError> {
        if capacity == 0 {
            return Err(SemcacheError::Config(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            store,
            capacity,
            write_lock: Mutex::new(()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Nearest stored entry to `key` with its similarity score.
    pub async fn nearest(&self, key: &str) -> Result<Option<(Document, f32)>, SemcacheError> {
        Ok(self.store.search(key, 1).await?.into_iter().next())
    }

    /// Admit `entry`, flushing first if the store is full.
    pub async fn admit(&self, entry: CacheEntry) -> Result<Admission, SemcacheError> {
        let _guard = self.write_lock.lock().await;
        self.admit_locked(entry).await
    }

    /// Like `admit`, but skip entries whose key is already live. The check and
    /// the insert happen under the same lock.
    pub async fn admit_if_absent(&self, entry: CacheEntry) -> Result<Admission, SemcacheError> {
        let _guard = self.write_lock.lock().await;
        if self.store.contains(&entry.key).await? {
            return Ok(Admission::Duplicate);
        }
        self.admit_locked(entry).await
    }

    async fn admit_locked(&self, entry: CacheEntry) -> Result<Admission, SemcacheError> {
        let live = self.store.count().await?;
        let flushed = live >= self.capacity;
        if flushed {
            tracing::info!(live, capacity = self.capacity, "cache at capacity, flushing");
            self.store.clear().await?;
        }

        let metadata = HashMap::from([(
            CACHED_RESPONSE_KEY.to_string(),
            Value::String(entry.response),
        )]);
        self.store.index(&entry.key, metadata).await?;
        Ok(Admission::Admitted { flushed })
    }

    /// Drop every entry.
    pub async fn flush(&self) -> Result<(), SemcacheError> {
        let _guard = self.write_lock.lock().await;
        self.store.clear().await
    }

    pub async fn live_count(&self) -> Result<usize, SemcacheError> {
        let _guard = self.write_lock.lock().await;
        self.store.count().await
    }
}
