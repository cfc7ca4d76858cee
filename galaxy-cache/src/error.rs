//! Error types for cache operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by the cache itself, as opposed to the render it wraps.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Properties could not be serialized for fingerprinting
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid cache configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend store failure
    #[error("Store error: {0}")]
    Store(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Outcome of a failed [`RenderCache::get_or_render`](crate::RenderCache::get_or_render).
#[derive(Debug, Clone, Error)]
pub enum GenerateError<E> {
    /// The render itself failed; nothing was cached.
    #[error("{0}")]
    Failed(E),

    /// No fresh render finished within `generate_timeout`.
    #[error("render did not complete within {0:?}")]
    Timeout(Duration),

    /// The render task panicked or was cancelled.
    #[error("render aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl<E> GenerateError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerateError::Timeout(_))
    }
}
