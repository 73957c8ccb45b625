//! Domain layer: entities, traits, and errors. Free of I/O concerns.

pub mod cache;
pub mod gateway;
pub mod workflow;
