//! Built-in step executors

pub mod generation;
pub mod template;

pub use generation::GenerationExecutor;
pub use template::TemplateExecutor;
