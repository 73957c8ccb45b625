//! In-memory response cache backed by moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use tracing::debug;

use crate::domain::cache::store::{CacheError, CachedGeneration, ResponseCache};

/// Cache sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub max_capacity: u64,
    /// TTL for interactive responses, in seconds
    pub ttl_interactive_secs: u64,
    /// TTL for structured responses, in seconds
    pub ttl_structured_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl_interactive_secs: 300,
            ttl_structured_secs: 3_600,
        }
    }
}

/// Entry wrapper carrying its own expiry. moka's global TTL acts as an
/// upper bound; per-entry TTLs are enforced on read.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedGeneration,
    expires_at: Instant,
}

/// In-process response cache
#[derive(Debug)]
pub struct InMemoryResponseCache {
    cache: Cache<String, CacheEntry>,
}

impl InMemoryResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        let max_ttl = config.ttl_interactive_secs.max(config.ttl_structured_secs);

        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(max_ttl))
            .build();

        Self { cache }
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> Result<Option<CachedGeneration>, CacheError> {
        match self.cache.get(key).await {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(key, "Cache hit");
                Ok(Some(entry.value))
            }
            Some(_) => {
                debug!(key, "Cache entry expired");
                self.cache.invalidate(key).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: String,
        entry: CachedGeneration,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Caching response");

        self.cache
            .insert(
                key,
                CacheEntry {
                    value: entry,
                    expires_at: Instant::now() + ttl,
                },
            )
            .await;

        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn len(&self) -> Result<u64, CacheError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count())
    }
}
