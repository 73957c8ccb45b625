//! Provider gateway
//!
//! Single entry point for generation traffic. Every request passes, in
//! order: per-caller sliding window, per-class token bucket, cache
//! lookup, then the retry/failover loop over health-ranked backends.
//! Successful live responses are written through to the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::domain::cache::key::cache_key;
use crate::domain::cache::store::{CachedGeneration, ResponseCache};
use crate::domain::gateway::backend::{BackendError, GenerationBackend};
use crate::domain::gateway::error::GatewayError;
use crate::domain::gateway::health::{BackendHealth, BackendHealthRecord};
use crate::domain::gateway::request::{GenerationRequest, PayloadClass};
use crate::domain::gateway::response::GenerationResponse;
use crate::infrastructure::ratelimit::sliding_window::SlidingWindowLimiter;
use crate::infrastructure::ratelimit::token_bucket::TokenBucketLimiter;

/// Health-aware, cached, rate-limited gateway over a prioritized set of
/// generation backends. Backend order in the constructor is priority
/// order.
#[derive(Debug)]
pub struct ProviderGateway {
    backends: Vec<Arc<dyn GenerationBackend>>,
    health: RwLock<HashMap<String, BackendHealthRecord>>,
    cache: Arc<dyn ResponseCache>,
    window: SlidingWindowLimiter,
    bucket: TokenBucketLimiter,
    config: GatewayConfig,
}

impl ProviderGateway {
    pub fn new(
        backends: Vec<Arc<dyn GenerationBackend>>,
        cache: Arc<dyn ResponseCache>,
        config: GatewayConfig,
    ) -> Self {
        let health = backends
            .iter()
            .map(|b| (b.name().to_string(), BackendHealthRecord::new(b.name())))
            .collect();

        Self {
            backends,
            health: RwLock::new(health),
            cache,
            window: SlidingWindowLimiter::new(config.sliding_window.clone()),
            bucket: TokenBucketLimiter::new(config.token_bucket.clone()),
            config,
        }
    }

    /// Execute a generation request.
    ///
    /// `preferred` names a backend to try first; it is only promoted to
    /// the front while Healthy, and the remaining candidates serve as
    /// failover.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        preferred: Option<&str>,
    ) -> Result<GenerationResponse, GatewayError> {
        let window_decision = self.window.check_and_record(request.caller()).await;
        if !window_decision.allowed {
            return Err(GatewayError::rate_limited(
                format!("caller '{}'", request.caller()),
                window_decision.retry_after.as_secs(),
            ));
        }

        let class = request.payload_class();
        let bucket_decision = self.bucket.try_acquire(class.as_str()).await;
        if !bucket_decision.allowed {
            return Err(GatewayError::rate_limited(
                format!("class '{}'", class.as_str()),
                bucket_decision.retry_after.as_secs(),
            ));
        }

        let key = cache_key(request);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                debug!(key = %key, "Serving generation from cache");
                return Ok(cached.response.from_cache());
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cache lookup failed, continuing"),
        }

        let candidates = self.candidates(preferred).await;
        if candidates.is_empty() {
            return Err(GatewayError::all_backends_failed(
                0,
                "no available backends",
            ));
        }

        let mut attempts = 0u32;
        let mut last_error = String::from("no attempts made");

        for backend in candidates {
            match self.try_backend(&backend, request, &mut attempts).await {
                Ok(response) => {
                    self.record_success(backend.name()).await;
                    self.write_through(key, request, &response, class).await;
                    return Ok(response);
                }
                Err(e) => {
                    debug!(backend = backend.name(), error = %e, "Backend exhausted, failing over");
                    last_error = e.to_string();
                }
            }
        }

        Err(GatewayError::all_backends_failed(attempts, last_error))
    }

    /// Run one backend's attempt loop: the initial call plus up to the
    /// backend's retry budget on transient failures. Rate-limited and
    /// permanent errors abandon the backend immediately.
    async fn try_backend(
        &self,
        backend: &Arc<dyn GenerationBackend>,
        request: &GenerationRequest,
        attempts: &mut u32,
    ) -> Result<GenerationResponse, BackendError> {
        let budget = self.retry_budget(backend.name());
        let attempt_timeout = Duration::from_millis(self.config.attempt_timeout_ms);

        let mut retry = 0u32;
        loop {
            *attempts += 1;

            let outcome = match timeout(attempt_timeout, backend.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::transient(format!(
                    "attempt timed out after {}ms",
                    self.config.attempt_timeout_ms
                ))),
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && retry < budget => {
                    self.record_error(backend.name()).await;
                    let delay = self.config.retry.delay_for_attempt(retry);
                    debug!(
                        backend = backend.name(),
                        retry = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient backend failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    self.record_error(backend.name()).await;
                    return Err(e);
                }
            }
        }
    }

    fn retry_budget(&self, backend: &str) -> u32 {
        self.config
            .retry_overrides
            .get(backend)
            .copied()
            .unwrap_or(self.config.retry.max_retries)
    }

    /// Rank backends for this request: the preferred backend first when
    /// Healthy, then Healthy backends in priority order, then Degraded
    /// ones (a Degraded preferred ranks with these). Unavailable
    /// backends are excluded entirely.
    async fn candidates(&self, preferred: Option<&str>) -> Vec<Arc<dyn GenerationBackend>> {
        let health = self.health.read().await;

        let health_of = |name: &str| {
            health
                .get(name)
                .map(|r| r.health())
                .unwrap_or(BackendHealth::Healthy)
        };

        let mut ordered: Vec<Arc<dyn GenerationBackend>> =
            Vec::with_capacity(self.backends.len());

        if let Some(name) = preferred {
            if let Some(backend) = self.backends.iter().find(|b| b.name() == name) {
                if health_of(name) == BackendHealth::Healthy {
                    ordered.push(Arc::clone(backend));
                }
            }
        }

        for wanted in [BackendHealth::Healthy, BackendHealth::Degraded] {
            for backend in &self.backends {
                if ordered.iter().any(|b| b.name() == backend.name()) {
                    continue;
                }
                if health_of(backend.name()) == wanted {
                    ordered.push(Arc::clone(backend));
                }
            }
        }

        ordered
    }

    async fn write_through(
        &self,
        key: String,
        request: &GenerationRequest,
        response: &GenerationResponse,
        class: PayloadClass,
    ) {
        let ttl = match class {
            PayloadClass::Interactive => Duration::from_secs(self.config.cache.ttl_interactive_secs),
            PayloadClass::Structured => Duration::from_secs(self.config.cache.ttl_structured_secs),
        };

        let entry = CachedGeneration {
            request: request.clone(),
            response: response.clone(),
        };

        if let Err(e) = self.cache.put(key, entry, ttl).await {
            warn!(error = %e, "Cache write failed, response served anyway");
        }
    }

    /// Record a successful request against a backend's health
    pub async fn record_success(&self, backend: &str) {
        if let Some(record) = self.health.write().await.get_mut(backend) {
            record.record_success();
        }
    }

    /// Record a failed request against a backend's health
    pub async fn record_error(&self, backend: &str) {
        if let Some(record) = self.health.write().await.get_mut(backend) {
            record.record_error(&self.config.health);
        }
    }

    /// Probe every backend, update health records with the outcome, and
    /// return a snapshot.
    pub async fn health_check(&self) -> HashMap<String, BackendHealthRecord> {
        for backend in &self.backends {
            let start = Instant::now();
            let outcome = backend.probe().await;
            let latency_ms = start.elapsed().as_millis() as u64;

            let mut health = self.health.write().await;
            if let Some(record) = health.get_mut(backend.name()) {
                match outcome {
                    Ok(()) => record.record_success(),
                    Err(_) => record.record_error(&self.config.health),
                }
                record.mark_checked(latency_ms);
            }
        }

        self.health.read().await.clone()
    }
}
