//! Generation request model

use serde::{Deserialize, Serialize};

/// Coarse classification of a request's payload, used for rate limiting
/// and cache TTL selection. Interactive traffic is short-lived; structured
/// output is stable enough to cache longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadClass {
    #[default]
    Interactive,
    Structured,
}

impl PayloadClass {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Interactive => "interactive",
            Self::Structured => "structured",
        }
    }
}

/// A backend-agnostic generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// User prompt
    prompt: String,

    /// Preferred model name, forwarded to the backend when it honors one
    #[serde(skip_serializing_if = "Option::is_none")]
    model_hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,

    /// Caller identity used for per-caller rate limiting
    caller: String,

    #[serde(default)]
    payload_class: PayloadClass,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            model_hint: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            caller: caller.into(),
            payload_class: PayloadClass::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model_hint(mut self, model: impl Into<String>) -> Self {
        self.model_hint = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_payload_class(mut self, payload_class: PayloadClass) -> Self {
        self.payload_class = payload_class;
        self
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model_hint(&self) -> Option<&str> {
        self.model_hint.as_deref()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn payload_class(&self) -> PayloadClass {
        self.payload_class
    }
}
