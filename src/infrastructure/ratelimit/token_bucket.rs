//! Per-class token bucket limiter

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::RateDecision;

/// Token bucket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBucketConfig {
    /// Maximum tokens a bucket can hold
    pub capacity: u64,
    /// Tokens restored per second
    pub refill_per_sec: f64,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            refill_per_sec: 1.0,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiter keyed by payload class.
///
/// Buckets start full and refill lazily: elapsed time is converted to
/// tokens at check time rather than by a background task.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    config: TokenBucketConfig,
    buckets: Arc<RwLock<HashMap<String, BucketState>>>,
}

impl TokenBucketLimiter {
    pub fn new(config: TokenBucketConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Take one token from the named bucket if available
    pub async fn try_acquire(&self, class: &str) -> RateDecision {
        let now = Instant::now();
        let mut buckets = self.buckets.write().await;

        let bucket = buckets.entry(class.to_string()).or_insert(BucketState {
            tokens: self.config.capacity as f64,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens =
            (bucket.tokens + elapsed * self.config.refill_per_sec).min(self.config.capacity as f64);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateDecision::allowed(bucket.tokens as u64, self.config.capacity)
        } else {
            let deficit = 1.0 - bucket.tokens;
            let retry_after = if self.config.refill_per_sec > 0.0 {
                Duration::from_secs_f64(deficit / self.config.refill_per_sec)
            } else {
                Duration::MAX
            };

            debug!(class, "Token bucket empty");
            RateDecision::denied(self.config.capacity, retry_after)
        }
    }
}
