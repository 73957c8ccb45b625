//! Gateway domain: backend contract, request/response model, health
//! tracking, and retry policy.

pub mod backend;
pub mod error;
pub mod health;
pub mod request;
pub mod response;
pub mod retry;

pub use backend::{BackendError, BackendErrorKind, GenerationBackend};
pub use error::GatewayError;
pub use health::{BackendHealth, BackendHealthRecord, HealthThresholds};
pub use request::{GenerationRequest, PayloadClass};
pub use response::{FinishReason, GenerationResponse, GenerationUsage};
pub use retry::RetryPolicy;
