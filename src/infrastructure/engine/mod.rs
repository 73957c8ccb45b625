//! Workflow engine implementation

pub mod engine;

pub use engine::WorkflowEngine;
