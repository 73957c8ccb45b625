//! Input resolution against completed step results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::error::WorkflowError;
use super::reference::StepReference;
use super::step::{StepDescriptor, StepId};

/// How unresolvable references are treated at dispatch time.
///
/// Permissive leaves the raw `${...}` text in place and logs a warning;
/// Strict fails the step before its executor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    #[default]
    Permissive,
    Strict,
}

/// Resolution context for one workflow execution. Holds the shared
/// context and the results of every completed step.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    shared_context: Value,
    results: BTreeMap<StepId, Value>,
    policy: ResolutionPolicy,
}

impl WorkflowContext {
    pub fn new(shared_context: Value, policy: ResolutionPolicy) -> Self {
        Self {
            shared_context,
            results: BTreeMap::new(),
            policy,
        }
    }

    pub fn shared_context(&self) -> &Value {
        &self.shared_context
    }

    pub fn results(&self) -> &BTreeMap<StepId, Value> {
        &self.results
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Record a completed step's result. Write-once per step.
    pub fn insert_result(&mut self, id: StepId, result: Value) -> Result<(), WorkflowError> {
        if self.results.contains_key(&id) {
            return Err(WorkflowError::invalid_state(format!(
                "result for step '{}' already recorded",
                id
            )));
        }

        self.results.insert(id, result);
        Ok(())
    }

    /// Resolve a step's inputs, replacing every reference with the value
    /// it points at. Literals pass through unchanged.
    pub fn resolve_inputs(
        &self,
        step: &StepDescriptor,
    ) -> Result<BTreeMap<String, Value>, WorkflowError> {
        let mut resolved = BTreeMap::new();

        for (name, value) in step.inputs() {
            resolved.insert(name.clone(), self.resolve_value(step.id(), value)?);
        }

        Ok(resolved)
    }

    fn resolve_value(&self, step: &StepId, value: &Value) -> Result<Value, WorkflowError> {
        match value {
            Value::String(s) => match StepReference::parse(s) {
                Some(reference) => self.resolve_reference(step, &reference),
                None => Ok(value.clone()),
            },
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve_value(step, item)?);
                }
                Ok(Value::Array(resolved))
            }
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    resolved.insert(key.clone(), self.resolve_value(step, item)?);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_reference(
        &self,
        step: &StepId,
        reference: &StepReference,
    ) -> Result<Value, WorkflowError> {
        let resolved = self
            .results
            .get(reference.step())
            .and_then(|result| reference.lookup(result));

        match resolved {
            Some(value) => Ok(value.clone()),
            None => match self.policy {
                ResolutionPolicy::Permissive => {
                    warn!(
                        step = %step,
                        reference = reference.raw(),
                        "Unresolvable reference left as literal"
                    );
                    Ok(Value::String(reference.raw().to_string()))
                }
                ResolutionPolicy::Strict => Err(WorkflowError::reference_resolution(
                    step.as_str(),
                    format!("cannot resolve '{}'", reference.raw()),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sid(id: &str) -> StepId {
        StepId::new(id).unwrap()
    }

    fn context_with_fetch_result(policy: ResolutionPolicy) -> WorkflowContext {
        let mut ctx = WorkflowContext::new(json!({"caller": "tests"}), policy);
        ctx.insert_result(
            sid("fetch"),
            json!({"content": "document body", "meta": {"pages": 3}}),
        )
        .unwrap();
        ctx
    }

    #[test]
    fn test_resolves_reference_to_result_value() {
        let ctx = context_with_fetch_result(ResolutionPolicy::Permissive);

        let step = StepDescriptor::new(sid("analyze"), "Analyze", "generation")
            .with_input("prompt", "${fetch.content}")
            .with_input("pages", "${fetch.meta.pages}")
            .depends_on(sid("fetch"));

        let inputs = ctx.resolve_inputs(&step).unwrap();
        assert_eq!(inputs["prompt"], json!("document body"));
        assert_eq!(inputs["pages"], json!(3));
    }

    #[test]
    fn test_literals_pass_through() {
        let ctx = context_with_fetch_result(ResolutionPolicy::Strict);

        let step = StepDescriptor::new(sid("s"), "S", "template")
            .with_input("text", "no references at all")
            .with_input("partial", "prefix ${fetch.content}")
            .with_input("count", 7);

        let inputs = ctx.resolve_inputs(&step).unwrap();
        assert_eq!(inputs["text"], json!("no references at all"));
        assert_eq!(inputs["partial"], json!("prefix ${fetch.content}"));
        assert_eq!(inputs["count"], json!(7));
    }

    #[test]
    fn test_resolves_inside_arrays_and_objects() {
        let ctx = context_with_fetch_result(ResolutionPolicy::Permissive);

        let step = StepDescriptor::new(sid("s"), "S", "template").with_input(
            "payload",
            json!({
                "items": ["${fetch.content}", "literal"],
                "nested": {"pages": "${fetch.meta.pages}"}
            }),
        );

        let inputs = ctx.resolve_inputs(&step).unwrap();
        assert_eq!(
            inputs["payload"],
            json!({
                "items": ["document body", "literal"],
                "nested": {"pages": 3}
            })
        );
    }

    #[test]
    fn test_permissive_leaves_unresolvable_as_literal() {
        let ctx = context_with_fetch_result(ResolutionPolicy::Permissive);

        let step = StepDescriptor::new(sid("s"), "S", "template")
            .with_input("a", "${fetch.missing.path}")
            .with_input("b", "${never-ran.output}");

        let inputs = ctx.resolve_inputs(&step).unwrap();
        assert_eq!(inputs["a"], json!("${fetch.missing.path}"));
        assert_eq!(inputs["b"], json!("${never-ran.output}"));
    }

    #[test]
    fn test_strict_fails_on_unresolvable() {
        let ctx = context_with_fetch_result(ResolutionPolicy::Strict);

        let step = StepDescriptor::new(sid("s"), "S", "template")
            .with_input("a", "${fetch.missing.path}");

        let err = ctx.resolve_inputs(&step).unwrap_err();
        assert!(matches!(err, WorkflowError::ReferenceResolution { .. }));
    }

    #[test]
    fn test_insert_result_write_once() {
        let mut ctx = WorkflowContext::new(Value::Null, ResolutionPolicy::default());

        ctx.insert_result(sid("a"), json!(1)).unwrap();
        assert!(ctx.insert_result(sid("a"), json!(2)).is_err());
        assert_eq!(ctx.results().get(&sid("a")), Some(&json!(1)));
    }
}
