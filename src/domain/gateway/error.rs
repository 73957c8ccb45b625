//! Gateway error types

use thiserror::Error;

/// Errors surfaced by the gateway to its callers
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Rate limited ({scope}), retry after {retry_after_secs}s")]
    RateLimited { scope: String, retry_after_secs: u64 },

    #[error("All backends failed after {attempts} attempts: {last_error}")]
    AllBackendsFailed { attempts: u32, last_error: String },
}

impl GatewayError {
    pub fn rate_limited(scope: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::RateLimited {
            scope: scope.into(),
            retry_after_secs,
        }
    }

    pub fn all_backends_failed(attempts: u32, last_error: impl Into<String>) -> Self {
        Self::AllBackendsFailed {
            attempts,
            last_error: last_error.into(),
        }
    }
}
