//! Workflow entity

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::WorkflowError;
use super::step::{validate_id, StepDescriptor, StepId};

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Create a new validated workflow ID
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a random workflow ID. Hyphenated UUIDs fit the ID pattern.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    /// Whether the workflow has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A workflow: an identified set of steps plus accumulated execution state.
///
/// The results map is write-once per step; a completed step's result is
/// never overwritten, even across retries of the surrounding batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    steps: Vec<StepDescriptor>,

    /// Workflow-scoped context available to every executor
    #[serde(default)]
    shared_context: Value,

    #[serde(default)]
    status: WorkflowStatus,

    /// Completed step results, keyed by step id
    #[serde(default)]
    results: BTreeMap<StepId, Value>,

    created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Create a new workflow in the Pending state
    pub fn new(id: WorkflowId, name: impl Into<String>, steps: Vec<StepDescriptor>) -> Self {
        Self {
            id,
            name: name.into(),
            steps,
            shared_context: Value::Null,
            status: WorkflowStatus::Pending,
            results: BTreeMap::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_shared_context(mut self, shared_context: Value) -> Self {
        self.shared_context = shared_context;
        self
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn shared_context(&self) -> &Value {
        &self.shared_context
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn results(&self) -> &BTreeMap<StepId, Value> {
        &self.results
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Look up a step by id
    pub fn step(&self, id: &StepId) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.id() == id)
    }

    /// Mutable step lookup, used by the engine to apply transitions
    pub fn step_mut(&mut self, id: &StepId) -> Option<&mut StepDescriptor> {
        self.steps.iter_mut().find(|s| s.id() == id)
    }

    // Lifecycle transitions

    pub fn mark_started(&mut self) {
        self.status = WorkflowStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.status = WorkflowStatus::Completed;
        self.finish();
    }

    pub fn mark_failed(&mut self) {
        self.status = WorkflowStatus::Failed;
        self.finish();
    }

    pub fn mark_cancelled(&mut self) {
        self.status = WorkflowStatus::Cancelled;
        self.finish();
    }

    fn finish(&mut self) {
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }

    /// Record a step's result. At most one result per step; recording a
    /// second result for the same step is an error.
    pub fn record_result(&mut self, id: StepId, result: Value) -> Result<(), WorkflowError> {
        if self.results.contains_key(&id) {
            return Err(WorkflowError::invalid_state(format!(
                "result for step '{}' already recorded",
                id
            )));
        }

        self.results.insert(id, result);
        Ok(())
    }
}
