//! Infrastructure layer: concrete implementations of the domain
//! contracts plus process-level concerns.

pub mod cache;
pub mod engine;
pub mod executors;
pub mod gateway;
pub mod logging;
pub mod ratelimit;
