//! Retry policy with exponential backoff

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Retry policy for transient backend failures.
///
/// `max_retries` counts retries after the initial attempt, so a policy of
/// 3 allows up to 4 calls against one backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter to each delay
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let mut delay_ms = base.min(self.max_delay_ms as f64);

        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.0..0.25);
            delay_ms += delay_ms * factor;
            delay_ms = delay_ms.min(self.max_delay_ms as f64);
        }

        Duration::from_millis(delay_ms as u64)
    }
}
