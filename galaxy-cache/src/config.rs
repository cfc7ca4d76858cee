//! Cache configuration types.

use crate::error::{CacheError, CacheResult};
use std::time::Duration;

/// Render cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCacheConfig {
    /// How long a rendered fragment stays fresh
    pub expires_in: Duration,

    /// Longest a caller waits for a fresh render before giving up
    pub generate_timeout: Duration,

    /// Namespace prepended to every stored key
    pub key_prefix: Option<String>,
}

impl RenderCacheConfig {
    /// Create a render cache configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use galaxy_cache::RenderCacheConfig;
    /// use std::time::Duration;
    ///
    /// let config = RenderCacheConfig::new(Duration::from_secs(60), Duration::from_millis(100)).unwrap();
    /// assert_eq!(config.expires_in, Duration::from_secs(60));
    ///
    /// assert!(RenderCacheConfig::new(Duration::from_secs(60), Duration::ZERO).is_err());
    /// ```
    pub fn new(expires_in: Duration, generate_timeout: Duration) -> CacheResult<Self> {
        if generate_timeout.is_zero() {
            return Err(CacheError::Config(
                "generateTimeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            expires_in,
            generate_timeout,
            key_prefix: None,
        })
    }

    /// Same as [`new`](Self::new) with both durations in milliseconds.
    pub fn from_millis(expires_in: u64, generate_timeout: u64) -> CacheResult<Self> {
        Self::new(
            Duration::from_millis(expires_in),
            Duration::from_millis(generate_timeout),
        )
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Build the final key with prefix if configured.
    pub fn build_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}
