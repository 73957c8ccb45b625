//! Gateway implementations

pub mod gateway;
pub mod openai_compat;

pub use gateway::ProviderGateway;
pub use openai_compat::OpenAiCompatBackend;
