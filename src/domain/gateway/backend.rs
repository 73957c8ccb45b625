//! Backend contract

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use super::request::GenerationRequest;
use super::response::GenerationResponse;

/// How a backend failure should be treated by the retry and failover
/// machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Worth retrying against the same backend
    Transient,
    /// The backend itself is throttling; move to the next candidate
    RateLimited,
    /// Retrying the same request cannot help
    Permanent,
}

/// Error returned by a generation backend
#[derive(Debug, Clone, Error)]
#[error("{kind:?} backend error: {message}")]
pub struct BackendError {
    kind: BackendErrorKind,
    message: String,
}

impl BackendError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_transient(&self) -> bool {
        self.kind == BackendErrorKind::Transient
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == BackendErrorKind::RateLimited
    }
}

/// A generation backend. Implementations wrap one upstream provider.
#[async_trait]
pub trait GenerationBackend: Send + Sync + Debug {
    /// Stable backend name, unique within a gateway
    fn name(&self) -> &str;

    /// Execute a generation request
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, BackendError>;

    /// Cheap liveness probe
    async fn probe(&self) -> Result<(), BackendError>;
}
