//! Template rendering executor

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::workflow::error::WorkflowError;
use crate::domain::workflow::executor::StepExecutor;
use crate::domain::workflow::step::StepDescriptor;

/// Renders the `template` input by substituting `{name}` placeholders
/// with the stringified value of the step's other inputs. Placeholders
/// with no matching input are left verbatim.
#[derive(Debug, Default)]
pub struct TemplateExecutor;

impl TemplateExecutor {
    pub fn new() -> Self {
        Self
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl StepExecutor for TemplateExecutor {
    fn kind(&self) -> &str {
        "template"
    }

    async fn execute(
        &self,
        step: &StepDescriptor,
        inputs: &BTreeMap<String, Value>,
        _shared_context: &Value,
    ) -> Result<Value, WorkflowError> {
        let template = inputs
            .get("template")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WorkflowError::validation(format!(
                    "step '{}' requires a string 'template' input",
                    step.id()
                ))
            })?;

        let mut rendered = template.to_string();
        for (name, value) in inputs {
            if name == "template" {
                continue;
            }
            rendered = rendered.replace(&format!("{{{}}}", name), &value_to_string(value));
        }

        Ok(json!({ "text": rendered }))
    }
}
