//! # flowgate
//!
//! DAG workflow orchestration backed by a hardened multi-provider LLM
//! gateway.
//!
//! Two halves:
//! - the **workflow engine** resolves step dependencies into execution
//!   batches, wires step outputs into downstream inputs via
//!   `${stepId.path}` references, and applies per-step timeouts, retries,
//!   skip propagation, and cooperative cancellation;
//! - the **provider gateway** fronts a prioritized set of generation
//!   backends with health-aware selection, retry with exponential
//!   backoff, failover, a content-addressed TTL response cache, and dual
//!   rate limiting (sliding window per caller, token bucket per payload
//!   class).
//!
//! [`build_engine`] wires the two together with the built-in executors.

pub mod config;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

pub use crate::config::FlowgateConfig;
pub use crate::domain::gateway::{GenerationBackend, GenerationRequest, GenerationResponse};
pub use crate::domain::workflow::{
    StepDescriptor, StepId, Workflow, WorkflowError, WorkflowId, WorkflowResult, WorkflowStatus,
};
pub use crate::infrastructure::engine::WorkflowEngine;
pub use crate::infrastructure::gateway::{OpenAiCompatBackend, ProviderGateway};

use crate::domain::cache::store::ResponseCache;
use crate::domain::workflow::executor::ExecutorRegistry;
use crate::infrastructure::cache::in_memory::InMemoryResponseCache;
use crate::infrastructure::executors::{GenerationExecutor, TemplateExecutor};

/// Wire up a gateway over the given backends and an engine with the
/// built-in `generation` and `template` executors registered.
pub fn build_engine(
    backends: Vec<Arc<dyn GenerationBackend>>,
    config: FlowgateConfig,
) -> (Arc<WorkflowEngine>, Arc<ProviderGateway>) {
    let cache: Arc<dyn ResponseCache> =
        Arc::new(InMemoryResponseCache::new(&config.gateway.cache));
    let gateway = Arc::new(ProviderGateway::new(backends, cache, config.gateway));

    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(GenerationExecutor::new(Arc::clone(&gateway))));
    registry.register(Arc::new(TemplateExecutor::new()));

    let engine = Arc::new(WorkflowEngine::new(Arc::new(registry), config.engine));

    (engine, gateway)
}

/// [`build_engine`] with HTTP backends constructed from the configured
/// endpoint list.
pub fn build_engine_from_config(
    config: FlowgateConfig,
) -> (Arc<WorkflowEngine>, Arc<ProviderGateway>) {
    let backends = config
        .gateway
        .backends
        .iter()
        .map(|endpoint| {
            Arc::new(OpenAiCompatBackend::new(
                endpoint.name.as_str(),
                endpoint.base_url.as_str(),
                endpoint.api_key.as_str(),
                endpoint.model.as_str(),
            )) as Arc<dyn GenerationBackend>
        })
        .collect();

    build_engine(backends, config)
}
