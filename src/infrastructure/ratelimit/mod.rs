//! Rate limiting primitives
//!
//! Two independent limiters guard the gateway: a sliding window per
//! caller and a token bucket per payload class. Both must admit a
//! request before it proceeds.

pub mod sliding_window;
pub mod token_bucket;

pub use sliding_window::{SlidingWindowConfig, SlidingWindowLimiter};
pub use token_bucket::{TokenBucketConfig, TokenBucketLimiter};

use std::time::Duration;

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests (or whole tokens) left after this decision
    pub remaining: u64,
    pub limit: u64,
    /// How long to wait before the next request could be admitted.
    /// Zero when allowed.
    pub retry_after: Duration,
}

impl RateDecision {
    pub fn allowed(remaining: u64, limit: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            limit,
            retry_after: Duration::ZERO,
        }
    }

    pub fn denied(limit: u64, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            limit,
            retry_after,
        }
    }
}
