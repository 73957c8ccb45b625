//! Configuration loading

pub mod app_config;

pub use app_config::{
    BackendEndpointConfig, EngineConfig, FlowgateConfig, GatewayConfig, LoggingConfig,
};
