//! Application configuration
//!
//! Layered: `config/default.toml`, then `config/local.toml`, then
//! environment variables with the `FLOWGATE` prefix and `__` separators
//! (e.g. `FLOWGATE__GATEWAY__ATTEMPT_TIMEOUT_MS=5000`).

use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::gateway::health::HealthThresholds;
use crate::domain::gateway::retry::RetryPolicy;
use crate::domain::workflow::context::ResolutionPolicy;
use crate::infrastructure::cache::in_memory::CacheConfig;
use crate::infrastructure::ratelimit::sliding_window::SlidingWindowConfig;
use crate::infrastructure::ratelimit::token_bucket::TokenBucketConfig;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FlowgateConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Workflow engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Default per-step timeout when a step declares none, in milliseconds
    pub default_timeout_ms: u64,

    /// Default executor re-invocation budget when a step declares none
    pub default_max_retries: u32,

    /// How unresolvable references are handled at dispatch
    #[serde(default)]
    pub resolution_policy: ResolutionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 60_000,
            default_max_retries: 0,
            resolution_policy: ResolutionPolicy::default(),
        }
    }
}

/// Declarative backend endpoint. List order is failover priority.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendEndpointConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

/// Provider gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Backends to construct at startup, highest priority first
    #[serde(default)]
    pub backends: Vec<BackendEndpointConfig>,

    /// Wall-clock budget for a single backend attempt, in milliseconds
    pub attempt_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Per-backend overrides for the retry budget
    #[serde(default)]
    pub retry_overrides: HashMap<String, u32>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub sliding_window: SlidingWindowConfig,

    #[serde(default)]
    pub token_bucket: TokenBucketConfig,

    #[serde(default)]
    pub health: HealthThresholds,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
            attempt_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            retry_overrides: HashMap::new(),
            cache: CacheConfig::default(),
            sliding_window: SlidingWindowConfig::default(),
            token_bucket: TokenBucketConfig::default(),
            health: HealthThresholds::default(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl FlowgateConfig {
    /// Load configuration from files and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("FLOWGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
