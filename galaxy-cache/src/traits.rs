//! Cache store trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Backend that holds completed fragments.
///
/// Expired entries must never be returned from [`get`](Self::get); whether
/// they are dropped lazily or by [`purge_expired`](Self::purge_expired) is up
/// to the backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a fragment, `Ok(None)` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a fragment. `None` means it never expires.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Remaining lifetime of `key`, `None` if it has no expiry or is absent.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Drop expired entries eagerly, returning how many were removed.
    async fn purge_expired(&self) -> CacheResult<usize> {
        Ok(0)
    }

    /// Get several keys concurrently, in input order.
    async fn get_many(&self, keys: &[&str]) -> CacheResult<Vec<Option<String>>> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.get(key));
        try_join_all(futures).await
    }
}
