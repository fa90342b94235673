//! Cache layer
//!
//! In-process caching of published post lists and lookups. Entries are
//! stored as JSON so any serializable value can be cached, and each entry
//! carries its own TTL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use folio::cache::{create_cache, CacheLayer};
//! use folio::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The methods are generic over the cached value, so the trait is not object
/// safe; callers hold the concrete cache behind an `Arc`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig {
            ttl_seconds: 1800,
            max_capacity: 10,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.default_ttl(), Duration::from_secs(1800));

        cache
            .set("key", &"value".to_string(), cache.default_ttl())
            .await
            .unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }
}
