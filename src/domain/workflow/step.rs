//! Step descriptor - the unit of work the engine schedules

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::WorkflowError;

/// Maximum length for step and workflow IDs
pub const MAX_ID_LENGTH: usize = 50;

/// Regex pattern for valid IDs: alphanumeric and hyphens
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated step identifier, unique within a workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId(String);

impl StepId {
    /// Create a new validated step ID
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StepId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StepId> for String {
    fn from(id: StepId) -> Self {
        id.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StepId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a step or workflow ID string
pub fn validate_id(id: &str) -> Result<(), WorkflowError> {
    if id.is_empty() {
        return Err(WorkflowError::validation("ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(WorkflowError::validation(format!(
            "ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(WorkflowError::validation(format!(
            "Invalid ID '{}': must be alphanumeric with hyphens, start and end with alphanumeric",
            id
        )));
    }

    Ok(())
}

/// Lifecycle state of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    /// Whether the step has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// A single step of a workflow's dependency graph.
///
/// Inputs are a name-to-value map; a string value of the exact form
/// `${<stepId>.<dot.separated.path>}` is resolved against an upstream step's
/// result before dispatch, any other value is passed through as a literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Unique id within the workflow
    id: StepId,

    /// Human-readable label
    name: String,

    /// Discriminates which executor handles this step
    executor_kind: String,

    /// Named inputs; values may be literals or references
    #[serde(default)]
    inputs: BTreeMap<String, Value>,

    /// Explicitly declared upstream steps
    #[serde(default)]
    dependencies: BTreeSet<StepId>,

    /// Optional per-step timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,

    /// Optional executor re-invocation budget
    #[serde(skip_serializing_if = "Option::is_none")]
    max_retries: Option<u32>,

    /// Current lifecycle state
    #[serde(default)]
    status: StepStatus,

    /// Opaque result payload, present once Completed
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,

    /// Error message, present iff Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl StepDescriptor {
    /// Create a new step descriptor
    pub fn new(id: StepId, name: impl Into<String>, executor_kind: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            executor_kind: executor_kind.into(),
            inputs: BTreeMap::new(),
            dependencies: BTreeSet::new(),
            timeout_ms: None,
            max_retries: None,
            status: StepStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    // Builder methods

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn with_inputs(mut self, inputs: BTreeMap<String, Value>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn depends_on(mut self, dependency: StepId) -> Self {
        self.dependencies.insert(dependency);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    // Getters

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executor_kind(&self) -> &str {
        &self.executor_kind
    }

    pub fn inputs(&self) -> &BTreeMap<String, Value> {
        &self.inputs
    }

    pub fn dependencies(&self) -> &BTreeSet<StepId> {
        &self.dependencies
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    // Lifecycle transitions, driven by the engine

    pub fn mark_running(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, result: Value) {
        self.status = StepStatus::Completed;
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_skipped(&mut self) {
        self.status = StepStatus::Skipped;
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_id_valid() {
        assert!(StepId::new("my-step").is_ok());
        assert!(StepId::new("step123").is_ok());
        assert!(StepId::new("a").is_ok());
    }

    #[test]
    fn test_step_id_invalid() {
        assert!(StepId::new("").is_err());
        assert!(StepId::new("-invalid").is_err());
        assert!(StepId::new("invalid-").is_err());
        assert!(StepId::new("has spaces").is_err());
        assert!(StepId::new("has_underscores").is_err());

        let long_id = "a".repeat(51);
        assert!(StepId::new(long_id).is_err());
    }

    #[test]
    fn test_step_id_serialization() {
        let id = StepId::new("fetch-data").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"fetch-data\"");

        let deserialized: StepId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_step_builder() {
        let step = StepDescriptor::new(StepId::new("analyze").unwrap(), "Analyze", "generation")
            .with_input("prompt", "Summarize ${fetch.content}")
            .depends_on(StepId::new("fetch").unwrap())
            .with_timeout_ms(30000)
            .with_max_retries(2);

        assert_eq!(step.id().as_str(), "analyze");
        assert_eq!(step.name(), "Analyze");
        assert_eq!(step.executor_kind(), "generation");
        assert_eq!(step.inputs().len(), 1);
        assert_eq!(step.dependencies().len(), 1);
        assert_eq!(step.timeout_ms(), Some(30000));
        assert_eq!(step.max_retries(), Some(2));
        assert_eq!(step.status(), StepStatus::Pending);
    }

    #[test]
    fn test_step_lifecycle() {
        let mut step =
            StepDescriptor::new(StepId::new("s1").unwrap(), "Step 1", "template");

        step.mark_running();
        assert_eq!(step.status(), StepStatus::Running);
        assert!(step.started_at().is_some());
        assert!(step.completed_at().is_none());

        step.mark_completed(json!({"ok": true}));
        assert_eq!(step.status(), StepStatus::Completed);
        assert_eq!(step.result(), Some(&json!({"ok": true})));
        assert!(step.error().is_none());
        assert!(step.completed_at().is_some());
    }

    #[test]
    fn test_step_failure_carries_error() {
        let mut step = StepDescriptor::new(StepId::new("s1").unwrap(), "Step 1", "generation");

        step.mark_running();
        step.mark_failed("backend exploded");

        assert_eq!(step.status(), StepStatus::Failed);
        assert_eq!(step.error(), Some("backend exploded"));
        assert!(step.result().is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StepStatus::Pending.is_terminal());
        assert!(!StepStatus::Running.is_terminal());
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Failed.is_terminal());
        assert!(StepStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_step_serialization() {
        let step = StepDescriptor::new(StepId::new("gen").unwrap(), "Generate", "generation")
            .with_input("prompt", "hello");

        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"id\":\"gen\""));
        assert!(json.contains("\"executor_kind\":\"generation\""));
        assert!(json.contains("\"status\":\"pending\""));

        let deserialized: StepDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id().as_str(), "gen");
    }
}
