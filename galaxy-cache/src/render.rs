//! Single-flight render cache.
//!
//! Lookups take the in-flight lock, check the store and then either join the
//! pending render for that key or start a new one. A render runs on its own
//! task, so it keeps going (and still populates the store) after every
//! waiter has timed out. On completion the fragment is written to the store
//! *before* the pending entry is removed, which means no caller can observe
//! the gap between the two and start a duplicate render.

use crate::config::RenderCacheConfig;
use crate::error::GenerateError;
use crate::fingerprint::Fingerprint;
use crate::memory::InMemoryCache;
use crate::traits::CacheStore;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// How a fragment was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store
    Hit,
    /// This caller started the render
    Miss,
    /// This caller waited on a render someone else started
    Joined,
    /// No cache configured
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Joined => "JOINED",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Generation<E> = Shared<BoxFuture<'static, Result<String, GenerateError<E>>>>;

struct InFlight<E> {
    id: u64,
    started_at: Instant,
    generation: Generation<E>,
}

type InFlightMap<E> = Arc<Mutex<HashMap<String, InFlight<E>>>>;

/// Memoizes rendered fragments by [`Fingerprint`].
///
/// `E` is the render error type. It must be `Clone` because every caller
/// joined to a failed render receives the same error.
pub struct RenderCache<E, S = InMemoryCache> {
    store: Arc<S>,
    config: RenderCacheConfig,
    in_flight: InFlightMap<E>,
    next_id: Arc<AtomicU64>,
}

impl<E, S> Clone for RenderCache<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            in_flight: Arc::clone(&self.in_flight),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<E> RenderCache<E, InMemoryCache> {
    /// Render cache backed by an [`InMemoryCache`].
    pub fn new(config: RenderCacheConfig) -> Self {
        Self::with_store(config, InMemoryCache::new())
    }
}

impl<E, S> RenderCache<E, S> {
    pub fn with_store(config: RenderCacheConfig, store: S) -> Self {
        Self::with_shared_store(config, Arc::new(store))
    }

    pub fn with_shared_store(config: RenderCacheConfig, store: Arc<S>) -> Self {
        Self {
            store,
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &RenderCacheConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Number of renders currently pending.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

impl<E, S> RenderCache<E, S>
where
    E: Clone + Send + Sync + 'static,
    S: CacheStore + 'static,
{
    /// Return the fragment for `fingerprint`, rendering it with `render` if
    /// no fresh copy exists and no render is already pending.
    ///
    /// `render` is only invoked when this caller starts the render. Failed
    /// renders are never stored.
    pub async fn get_or_render<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        render: F,
    ) -> Result<(String, CacheStatus), GenerateError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>> + Send + 'static,
    {
        let key = self.config.build_key(fingerprint.as_str());
        let timeout = self.config.generate_timeout;

        let (generation, status) = {
            let mut in_flight = self.in_flight.lock().await;

            if let Some(fragment) = self.store.get(&key).await? {
                galaxy_log::trace!("render cache hit: {}", key);
                return Ok((fragment, CacheStatus::Hit));
            }

            let joinable = in_flight
                .get(&key)
                .filter(|pending| pending.started_at.elapsed() < timeout)
                .map(|pending| pending.generation.clone());

            match joinable {
                Some(generation) => {
                    galaxy_log::trace!("joining pending render: {}", key);
                    (generation, CacheStatus::Joined)
                }
                None => {
                    if in_flight.contains_key(&key) {
                        galaxy_log::debug!("replacing stale render: {}", key);
                    }
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let generation = self.start(key.clone(), id, render());
                    in_flight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            started_at: Instant::now(),
                            generation: generation.clone(),
                        },
                    );
                    (generation, CacheStatus::Miss)
                }
            }
        };

        match tokio::time::timeout(timeout, generation).await {
            Ok(Ok(fragment)) => Ok((fragment, status)),
            Ok(Err(err)) => Err(err),
            Err(_) => {
                galaxy_log::warn!("render of {} exceeded {:?}", key, timeout);
                Err(GenerateError::Timeout(timeout))
            }
        }
    }

    fn start<Fut>(&self, key: String, id: u64, render: Fut) -> Generation<E>
    where
        Fut: Future<Output = Result<String, E>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let ttl = self.config.expires_in;

        let task = tokio::spawn(async move {
            let result = render.await;

            if let Ok(fragment) = &result {
                if let Err(err) = store.set(&key, fragment.clone(), Some(ttl)).await {
                    galaxy_log::warn!("failed to store fragment {}: {}", key, err);
                }
            }

            let mut pending = in_flight.lock().await;
            if pending.get(&key).is_some_and(|entry| entry.id == id) {
                pending.remove(&key);
            }

            result
        });

        // A panicked render leaves its entry behind until it goes stale.
        async move {
            match task.await {
                Ok(Ok(fragment)) => Ok(fragment),
                Ok(Err(err)) => Err(GenerateError::Failed(err)),
                Err(join) => Err(GenerateError::Aborted(join.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    /// Drop the stored fragment for `fingerprint`. A pending render is left
    /// alone and will store its result when done.
    pub async fn invalidate(&self, fingerprint: &Fingerprint) -> Result<(), GenerateError<E>> {
        let key = self.config.build_key(fingerprint.as_str());
        self.store.delete(&key).await?;
        Ok(())
    }

    /// Drop every stored fragment and forget pending renders.
    pub async fn clear(&self) -> Result<(), GenerateError<E>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.clear();
        self.store.clear().await?;
        Ok(())
    }

    /// Remove expired fragments from the store.
    pub async fn purge_expired(&self) -> Result<usize, GenerateError<E>> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            galaxy_log::debug!("purged {} expired fragments", purged);
        }
        Ok(purged)
    }
}
