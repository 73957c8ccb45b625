//! Generation response model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why the backend stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

/// Unit accounting reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GenerationUsage {
    pub input_units: u32,
    pub output_units: u32,
    pub total_units: u32,
}

impl GenerationUsage {
    pub fn new(input_units: u32, output_units: u32) -> Self {
        Self {
            input_units,
            output_units,
            total_units: input_units + output_units,
        }
    }
}

/// A backend-agnostic generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Response identifier assigned at creation
    id: String,

    /// Name of the backend that produced the output
    backend: String,

    /// Generated text
    output: String,

    finish_reason: FinishReason,

    #[serde(default)]
    usage: GenerationUsage,

    /// Whether this response was returned from the cache rather than a
    /// live backend call
    #[serde(default)]
    served_from_cache: bool,
}

impl GenerationResponse {
    pub fn new(
        backend: impl Into<String>,
        output: impl Into<String>,
        finish_reason: FinishReason,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            backend: backend.into(),
            output: output.into(),
            finish_reason,
            usage: GenerationUsage::default(),
            served_from_cache: false,
        }
    }

    pub fn with_usage(mut self, usage: GenerationUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Mark this response as served from the cache
    pub fn from_cache(mut self) -> Self {
        self.served_from_cache = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn finish_reason(&self) -> FinishReason {
        self.finish_reason
    }

    pub fn usage(&self) -> GenerationUsage {
        self.usage
    }

    pub fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_builder() {
        let response = GenerationResponse::new("primary", "generated text", FinishReason::Stop)
            .with_usage(GenerationUsage::new(12, 34));

        assert_eq!(response.backend(), "primary");
        assert_eq!(response.output(), "generated text");
        assert_eq!(response.finish_reason(), FinishReason::Stop);
        assert_eq!(response.usage().total_units, 46);
        assert!(!response.served_from_cache());
        assert!(!response.id().is_empty());
    }

    #[test]
    fn test_from_cache_marks_response() {
        let response =
            GenerationResponse::new("primary", "text", FinishReason::Stop).from_cache();
        assert!(response.served_from_cache());
    }

    #[test]
    fn test_usage_totals() {
        let usage = GenerationUsage::new(100, 50);
        assert_eq!(usage.total_units, 150);
    }
}
