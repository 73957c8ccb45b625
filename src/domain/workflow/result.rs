//! Execution reports returned by the engine

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Workflow, WorkflowId, WorkflowStatus};
use super::step::{StepId, StepStatus};

/// Per-step slice of a workflow report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub id: StepId,
    pub name: String,
    pub status: StepStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Aggregate counters across a workflow's steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_rate: f64,
}

/// Point-in-time snapshot of a workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: WorkflowId,
    pub name: String,
    pub status: WorkflowStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    pub steps: Vec<StepReport>,
    pub results: BTreeMap<StepId, Value>,
    pub summary: WorkflowSummary,
}

impl WorkflowResult {
    /// Build a snapshot report from the current workflow state
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let steps: Vec<StepReport> = workflow
            .steps()
            .iter()
            .map(|step| StepReport {
                id: step.id().clone(),
                name: step.name().to_string(),
                status: step.status(),
                result: step.result().cloned(),
                error: step.error().map(str::to_string),
                started_at: step.started_at(),
                completed_at: step.completed_at(),
                duration_ms: duration_between(step.started_at(), step.completed_at()),
            })
            .collect();

        let total = steps.len();
        let completed = steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        let failed = steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count();
        let skipped = steps
            .iter()
            .filter(|s| s.status == StepStatus::Skipped)
            .count();

        let success_rate = if total > 0 {
            completed as f64 / total as f64
        } else {
            1.0
        };

        Self {
            workflow_id: workflow.id().clone(),
            name: workflow.name().to_string(),
            status: workflow.status(),
            started_at: workflow.started_at(),
            completed_at: workflow.completed_at(),
            duration_ms: duration_between(workflow.started_at(), workflow.completed_at()),
            steps,
            results: workflow.results().clone(),
            summary: WorkflowSummary {
                total,
                completed,
                failed,
                skipped,
                success_rate,
            },
        }
    }
}

fn duration_between(
    started: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
) -> Option<u64> {
    match (started, completed) {
        (Some(start), Some(end)) => {
            let millis = (end - start).num_milliseconds();
            Some(millis.max(0) as u64)
        }
        _ => None,
    }
}
