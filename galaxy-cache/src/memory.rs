//! In-memory fragment store

use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Expired entries are swept on write at most this often.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Process-local store with per-entry expiry.
///
/// Expired entries are invisible to reads immediately. They are dropped in
/// bulk by the first write after the earliest expiry has passed (no more
/// than once per sweep interval), or by [`CacheStore::purge_expired`].
#[derive(Clone)]
pub struct InMemoryCache {
    data: Arc<RwLock<Entries>>,
    sweep_interval: Duration,
}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    /// When the next write should sweep
    next_sweep: Option<Instant>,
    /// No sweep runs before this
    not_before: Option<Instant>,
}

impl Entries {
    fn schedule(&mut self, expires_at: Instant) {
        let at = self.not_before.map_or(expires_at, |floor| expires_at.max(floor));
        self.next_sweep = Some(self.next_sweep.map_or(at, |next| next.min(at)));
    }

    fn sweep(&mut self, now: Instant, interval: Duration) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live(now));

        self.not_before = Some(now + interval);
        self.next_sweep = None;
        if let Some(earliest) = self.map.values().filter_map(|e| e.expires_at).min() {
            self.schedule(earliest);
        }

        before - self.map.len()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that sweeps expired entries on write at most once per `interval`.
    pub fn with_sweep_interval(interval: Duration) -> Self {
        Self {
            data: Arc::new(RwLock::new(Entries::default())),
            sweep_interval: interval,
        }
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.data.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.map.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.read().await;
        let now = Instant::now();
        Ok(data
            .map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let now = Instant::now();
        let mut data = self.data.write().await;

        if data.next_sweep.is_some_and(|at| at <= now) {
            let swept = data.sweep(now, self.sweep_interval);
            if swept > 0 {
                galaxy_log::trace!("swept {} expired fragments", swept);
            }
        }

        let expires_at = ttl.map(|d| now + d);
        data.map
            .insert(key.to_string(), CacheEntry { value, expires_at });
        if let Some(expires_at) = expires_at {
            data.schedule(expires_at);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.data.write().await.map.remove(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut data = self.data.write().await;
        data.map.clear();
        data.next_sweep = None;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let data = self.data.read().await;
        let now = Instant::now();
        Ok(data
            .map
            .get(key)
            .and_then(|entry| entry.expires_at)
            .filter(|exp| *exp > now)
            .map(|exp| exp - now))
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        let mut data = self.data.write().await;
        Ok(data.sweep(Instant::now(), self.sweep_interval))
    }
}
