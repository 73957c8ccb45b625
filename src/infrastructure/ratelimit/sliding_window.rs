//! Per-caller sliding window limiter

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::RateDecision;

/// Sliding window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SlidingWindowConfig {
    /// Maximum requests per caller within the window
    pub max_requests: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
        }
    }
}

/// Sliding window limiter keyed by caller identity.
///
/// Each caller's request timestamps are kept for one window length;
/// stale timestamps are pruned on every check, and empty callers are
/// swept periodically so the map does not grow without bound.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: SlidingWindowConfig,
    windows: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    last_cleanup: Arc<RwLock<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
            last_cleanup: Arc::new(RwLock::new(Instant::now())),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }

    /// Check the caller's budget and record the request if admitted.
    /// Denied requests are not recorded and do not extend the window.
    pub async fn check_and_record(&self, caller: &str) -> RateDecision {
        self.maybe_cleanup().await;

        let now = Instant::now();
        let window = self.window();
        let mut windows = self.windows.write().await;

        let timestamps = windows.entry(caller.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if (timestamps.len() as u64) < self.config.max_requests {
            timestamps.push(now);
            let remaining = self.config.max_requests - timestamps.len() as u64;
            RateDecision::allowed(remaining, self.config.max_requests)
        } else {
            // Oldest recorded request determines when a slot frees up.
            let retry_after = timestamps
                .first()
                .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(window);

            debug!(caller, "Sliding window limit reached");
            RateDecision::denied(self.config.max_requests, retry_after)
        }
    }

    /// Drop all recorded requests for a caller
    pub async fn reset(&self, caller: &str) {
        self.windows.write().await.remove(caller);
    }

    /// Sweep callers whose every timestamp has aged out. Runs at most
    /// once per window length.
    async fn maybe_cleanup(&self) {
        let window = self.window();

        {
            let last = self.last_cleanup.read().await;
            if last.elapsed() < window {
                return;
            }
        }

        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < window);
            !timestamps.is_empty()
        });

        *self.last_cleanup.write().await = Instant::now();
    }
}
