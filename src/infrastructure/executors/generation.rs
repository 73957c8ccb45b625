//! Generation executor
//!
//! Bridges workflow steps to the provider gateway: step inputs become a
//! generation request, the gateway response becomes the step result.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::gateway::request::{GenerationRequest, PayloadClass};
use crate::domain::workflow::error::WorkflowError;
use crate::domain::workflow::executor::StepExecutor;
use crate::domain::workflow::step::StepDescriptor;
use crate::infrastructure::gateway::ProviderGateway;

/// Caller identity used when the shared context does not name one
const DEFAULT_CALLER: &str = "workflow-engine";

/// Executor for `generation` steps
#[derive(Debug)]
pub struct GenerationExecutor {
    gateway: Arc<ProviderGateway>,
}

impl GenerationExecutor {
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        Self { gateway }
    }

    fn build_request(
        &self,
        step: &StepDescriptor,
        inputs: &BTreeMap<String, Value>,
        shared_context: &Value,
    ) -> Result<GenerationRequest, WorkflowError> {
        let prompt = inputs.get("prompt").and_then(Value::as_str).ok_or_else(|| {
            WorkflowError::validation(format!(
                "step '{}' requires a string 'prompt' input",
                step.id()
            ))
        })?;

        let caller = shared_context
            .get("caller")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CALLER);

        let mut request = GenerationRequest::new(prompt, caller);

        if let Some(system) = inputs.get("system").and_then(Value::as_str) {
            request = request.with_system(system);
        }
        if let Some(model) = inputs.get("model").and_then(Value::as_str) {
            request = request.with_model_hint(model);
        }
        if let Some(temperature) = inputs.get("temperature").and_then(Value::as_f64) {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = inputs.get("max_tokens").and_then(Value::as_u64) {
            request = request.with_max_tokens(max_tokens as u32);
        }
        if let Some(top_p) = inputs.get("top_p").and_then(Value::as_f64) {
            request = request.with_top_p(top_p);
        }
        if let Some(class) = inputs.get("payload_class") {
            let class: PayloadClass = serde_json::from_value(class.clone()).map_err(|_| {
                WorkflowError::validation(format!(
                    "step '{}': payload_class must be 'interactive' or 'structured'",
                    step.id()
                ))
            })?;
            request = request.with_payload_class(class);
        }

        Ok(request)
    }
}

#[async_trait]
impl StepExecutor for GenerationExecutor {
    fn kind(&self) -> &str {
        "generation"
    }

    async fn execute(
        &self,
        step: &StepDescriptor,
        inputs: &BTreeMap<String, Value>,
        shared_context: &Value,
    ) -> Result<Value, WorkflowError> {
        let request = self.build_request(step, inputs, shared_context)?;
        let preferred = inputs.get("preferred_backend").and_then(Value::as_str);

        let response = self
            .gateway
            .generate(&request, preferred)
            .await
            .map_err(|e| WorkflowError::step_execution(step.id().as_str(), e.to_string()))?;

        serde_json::to_value(&response)
            .map_err(|e| WorkflowError::step_execution(step.id().as_str(), e.to_string()))
    }
}
