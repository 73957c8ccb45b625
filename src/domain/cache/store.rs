//! Response cache contract

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::gateway::request::GenerationRequest;
use crate::domain::gateway::response::GenerationResponse;

/// A cache store failure. The gateway treats these as best-effort: a
/// failed lookup or write is logged and the request proceeds against the
/// live backends.
#[derive(Debug, Clone, Error)]
#[error("Cache error: {message}")]
pub struct CacheError {
    message: String,
}

impl CacheError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A cached generation. The originating request is stored alongside the
/// response so entries can be audited and keys re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedGeneration {
    pub request: GenerationRequest,
    pub response: GenerationResponse,
}

/// Async TTL cache for generation responses
#[async_trait]
pub trait ResponseCache: Send + Sync + Debug {
    /// Fetch a non-expired entry by key
    async fn get(&self, key: &str) -> Result<Option<CachedGeneration>, CacheError>;

    /// Store an entry with a per-entry time-to-live
    async fn put(
        &self,
        key: String,
        entry: CachedGeneration,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Remove an entry, if present
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Number of live entries
    async fn len(&self) -> Result<u64, CacheError>;
}
