//! Render caching for Galaxy.
//!
//! Rendering a component is the expensive step of a Galaxy response, so its
//! output is memoized per [`Fingerprint`]: the component's identity, its
//! properties and the request path. [`RenderCache`] adds the two guarantees
//! a plain key/value store does not give:
//!
//! - **Single-flight** - concurrent callers that miss on the same fingerprint
//!   share one render instead of each starting their own.
//! - **Bounded waits** - nobody waits longer than `generate_timeout` for a
//!   fresh render.
//!
//! Completed fragments live in a [`CacheStore`]; [`InMemoryCache`] is the
//! default backend.
//!
//! # Example
//!
//! ```no_run
//! use galaxy_cache::*;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), GenerateError<String>> {
//! let config = RenderCacheConfig::new(Duration::from_secs(60), Duration::from_millis(500))?;
//! let cache: RenderCache<String> = RenderCache::new(config);
//!
//! let fingerprint = Fingerprint::compute("pages::about", &json!({"msg": "hi"}), "/about")?;
//! let (fragment, status) = cache
//!     .get_or_render(&fingerprint, || async { Ok::<_, String>("<div>hi</div>".to_string()) })
//!     .await?;
//!
//! assert_eq!(fragment, "<div>hi</div>");
//! assert_eq!(status, CacheStatus::Miss);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod render;
pub mod traits;

pub use config::RenderCacheConfig;
pub use error::{CacheError, CacheResult, GenerateError};
pub use fingerprint::Fingerprint;
pub use memory::InMemoryCache;
pub use render::{CacheStatus, RenderCache};
pub use traits::CacheStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::RenderCacheConfig;
    pub use crate::error::{CacheError, CacheResult, GenerateError};
    pub use crate::fingerprint::Fingerprint;
    pub use crate::memory::InMemoryCache;
    pub use crate::render::{CacheStatus, RenderCache};
    pub use crate::traits::CacheStore;
}
