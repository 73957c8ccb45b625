//! Workflow engine
//!
//! Executes workflows batch by batch: every step in a batch runs
//! concurrently, the next batch starts only once the whole batch has
//! settled. A step failure skips its transitive dependents and fails
//! the workflow; cancellation is cooperative and observed at batch
//! boundaries.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::workflow::context::WorkflowContext;
use crate::domain::workflow::entity::{Workflow, WorkflowId, WorkflowStatus};
use crate::domain::workflow::error::WorkflowError;
use crate::domain::workflow::executor::{ExecutorRegistry, StepExecutor};
use crate::domain::workflow::graph::DependencyGraph;
use crate::domain::workflow::result::WorkflowResult;
use crate::domain::workflow::step::{StepDescriptor, StepId, StepStatus};

/// One registered workflow plus its execution state
#[derive(Debug)]
struct WorkflowHandle {
    workflow: RwLock<Workflow>,
    graph: DependencyGraph,
    cancelled: AtomicBool,
}

/// Batch-scheduling workflow engine
#[derive(Debug)]
pub struct WorkflowEngine {
    registry: Arc<ExecutorRegistry>,
    workflows: RwLock<HashMap<WorkflowId, Arc<WorkflowHandle>>>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(registry: Arc<ExecutorRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            workflows: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a workflow. Validates the dependency graph and checks
    /// that every step names a registered executor kind.
    pub async fn create_workflow(
        &self,
        name: impl Into<String>,
        steps: Vec<StepDescriptor>,
        shared_context: Value,
    ) -> Result<WorkflowId, WorkflowError> {
        for step in &steps {
            if !self.registry.contains_kind(step.executor_kind()) {
                return Err(WorkflowError::unknown_executor(
                    step.id().as_str(),
                    step.executor_kind(),
                ));
            }
        }

        let graph = DependencyGraph::build(&steps)?;

        let id = WorkflowId::generate();
        let workflow =
            Workflow::new(id.clone(), name, steps).with_shared_context(shared_context);

        debug!(workflow = %id, "Workflow created");

        self.workflows.write().await.insert(
            id.clone(),
            Arc::new(WorkflowHandle {
                workflow: RwLock::new(workflow),
                graph,
                cancelled: AtomicBool::new(false),
            }),
        );

        Ok(id)
    }

    /// Execute a Pending workflow to completion and return the final
    /// report. A workflow executes at most once.
    pub async fn execute_workflow(&self, id: &WorkflowId) -> Result<WorkflowResult, WorkflowError> {
        let handle = self.handle(id).await?;

        let (shared_context, batches) = {
            let mut workflow = handle.workflow.write().await;

            if workflow.status() != WorkflowStatus::Pending {
                return Err(WorkflowError::invalid_state(format!(
                    "workflow '{}' is {:?}, only Pending workflows can be executed",
                    id,
                    workflow.status()
                )));
            }

            workflow.mark_started();
            (
                workflow.shared_context().clone(),
                handle.graph.batches().to_vec(),
            )
        };

        info!(workflow = %id, batches = batches.len(), "Workflow execution started");

        let mut context =
            WorkflowContext::new(shared_context.clone(), self.config.resolution_policy);
        let mut failed = false;

        for batch in &batches {
            if handle.cancelled.load(Ordering::SeqCst) {
                info!(workflow = %id, "Workflow cancelled, stopping at batch boundary");
                break;
            }

            let runnable = self.prepare_batch(&handle, batch, &context).await;
            let outcomes = self.run_batch(runnable, &shared_context).await;

            let batch_failures = self
                .apply_outcomes(&handle, outcomes, &mut context)
                .await?;

            if !batch_failures.is_empty() {
                self.skip_dependents(&handle, &batch_failures).await;
                failed = true;
                break;
            }
        }

        {
            let mut workflow = handle.workflow.write().await;
            if !workflow.status().is_terminal() {
                if handle.cancelled.load(Ordering::SeqCst) {
                    workflow.mark_cancelled();
                } else if failed {
                    workflow.mark_failed();
                } else {
                    workflow.mark_completed();
                }
            }

            info!(workflow = %id, status = ?workflow.status(), "Workflow execution finished");
            Ok(WorkflowResult::from_workflow(&workflow))
        }
    }

    /// Resolve inputs and apply pre-dispatch transitions for one batch.
    /// Returns the steps that should actually run, paired with their
    /// executor and resolved inputs.
    async fn prepare_batch(
        &self,
        handle: &WorkflowHandle,
        batch: &[StepId],
        context: &WorkflowContext,
    ) -> Vec<(StepDescriptor, Arc<dyn StepExecutor>, BTreeMap<String, Value>)> {
        let mut workflow = handle.workflow.write().await;
        let mut runnable = Vec::with_capacity(batch.len());

        for step_id in batch {
            let Some(step) = workflow.step(step_id) else {
                continue;
            };

            // Already skipped by an upstream failure.
            if step.status().is_terminal() {
                continue;
            }

            let resolved = match context.resolve_inputs(step) {
                Ok(inputs) => inputs,
                Err(e) => {
                    warn!(step = %step_id, error = %e, "Input resolution failed");
                    if let Some(step) = workflow.step_mut(step_id) {
                        step.mark_running();
                        step.mark_failed(e.to_string());
                    }
                    continue;
                }
            };

            // Kinds were validated at creation; a missing executor here
            // means the registry changed underneath us.
            let Some(executor) = self.registry.get(step.executor_kind()) else {
                if let Some(step) = workflow.step_mut(step_id) {
                    step.mark_running();
                    step.mark_failed(format!(
                        "executor kind '{}' is no longer registered",
                        step.executor_kind()
                    ));
                }
                continue;
            };

            let step = step.clone();
            if let Some(step) = workflow.step_mut(step_id) {
                step.mark_running();
            }

            runnable.push((step, executor, resolved));
        }

        runnable
    }

    /// Run every prepared step concurrently and collect the outcomes
    async fn run_batch(
        &self,
        runnable: Vec<(StepDescriptor, Arc<dyn StepExecutor>, BTreeMap<String, Value>)>,
        shared_context: &Value,
    ) -> Vec<(StepId, Result<Value, WorkflowError>)> {
        let futures = runnable.into_iter().map(|(step, executor, inputs)| {
            let shared_context = shared_context.clone();
            let timeout_ms = step.timeout_ms().unwrap_or(self.config.default_timeout_ms);
            let max_retries = step
                .max_retries()
                .unwrap_or(self.config.default_max_retries);

            async move {
                let id = step.id().clone();
                let outcome = self
                    .run_step(&step, &executor, &inputs, &shared_context, timeout_ms, max_retries)
                    .await;
                (id, outcome)
            }
        });

        join_all(futures).await
    }

    /// Run one step: up to `max_retries + 1` executor invocations, all
    /// under a single wall-clock timeout.
    async fn run_step(
        &self,
        step: &StepDescriptor,
        executor: &Arc<dyn StepExecutor>,
        inputs: &BTreeMap<String, Value>,
        shared_context: &Value,
        timeout_ms: u64,
        max_retries: u32,
    ) -> Result<Value, WorkflowError> {
        let attempts = async {
            let mut last_error =
                WorkflowError::step_execution(step.id().as_str(), "no attempts made");

            for attempt in 0..=max_retries {
                match executor.execute(step, inputs, shared_context).await {
                    Ok(result) => return Ok(result),
                    Err(e) => {
                        debug!(
                            step = %step.id(),
                            attempt = attempt + 1,
                            error = %e,
                            "Step attempt failed"
                        );
                        last_error = e;
                    }
                }
            }

            Err(last_error)
        };

        match timeout(Duration::from_millis(timeout_ms), attempts).await {
            Ok(outcome) => outcome,
            Err(_) => Err(WorkflowError::step_timeout(step.id().as_str(), timeout_ms)),
        }
    }

    /// Apply batch outcomes to the workflow and the resolution context.
    /// Returns the ids of steps that failed in this batch, including
    /// pre-dispatch failures.
    async fn apply_outcomes(
        &self,
        handle: &WorkflowHandle,
        outcomes: Vec<(StepId, Result<Value, WorkflowError>)>,
        context: &mut WorkflowContext,
    ) -> Result<BTreeSet<StepId>, WorkflowError> {
        let mut workflow = handle.workflow.write().await;
        let mut failures = BTreeSet::new();

        for (step_id, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    workflow.record_result(step_id.clone(), result.clone())?;
                    context.insert_result(step_id.clone(), result.clone())?;
                    if let Some(step) = workflow.step_mut(&step_id) {
                        step.mark_completed(result);
                    }
                }
                Err(e) => {
                    if let Some(step) = workflow.step_mut(&step_id) {
                        step.mark_failed(e.to_string());
                    }
                    failures.insert(step_id);
                }
            }
        }

        // Pick up pre-dispatch failures recorded by prepare_batch.
        for step in workflow.steps() {
            if step.status() == StepStatus::Failed {
                failures.insert(step.id().clone());
            }
        }

        Ok(failures)
    }

    /// Mark every transitive dependent of the failed steps as Skipped
    async fn skip_dependents(&self, handle: &WorkflowHandle, failed: &BTreeSet<StepId>) {
        let to_skip = handle.graph.transitive_dependents(failed);
        let mut workflow = handle.workflow.write().await;

        for step_id in &to_skip {
            if let Some(step) = workflow.step_mut(step_id) {
                if !step.status().is_terminal() {
                    debug!(step = %step_id, "Skipping dependent of failed step");
                    step.mark_skipped();
                }
            }
        }
    }

    /// Point-in-time snapshot of a workflow's state
    pub async fn get_workflow_status(
        &self,
        id: &WorkflowId,
    ) -> Result<WorkflowResult, WorkflowError> {
        let handle = self.handle(id).await?;
        let workflow = handle.workflow.read().await;
        Ok(WorkflowResult::from_workflow(&workflow))
    }

    /// Request cancellation of a Running workflow. Steps already in
    /// flight finish; no further batch starts. The workflow transitions
    /// to Cancelled once the executing task observes the flag, so the
    /// terminal timestamp is stamped after the in-flight batch settles.
    pub async fn cancel_workflow(&self, id: &WorkflowId) -> Result<(), WorkflowError> {
        let handle = self.handle(id).await?;

        {
            let workflow = handle.workflow.read().await;
            if workflow.status() != WorkflowStatus::Running {
                return Err(WorkflowError::invalid_state(format!(
                    "workflow '{}' is {:?}, only Running workflows can be cancelled",
                    id,
                    workflow.status()
                )));
            }
        }

        handle.cancelled.store(true, Ordering::SeqCst);
        info!(workflow = %id, "Workflow cancellation requested");
        Ok(())
    }

    /// Ids of all registered workflows
    pub async fn list_workflows(&self) -> Vec<WorkflowId> {
        self.workflows.read().await.keys().cloned().collect()
    }

    /// Remove a workflow that is not currently running
    pub async fn remove_workflow(&self, id: &WorkflowId) -> Result<(), WorkflowError> {
        let handle = self.handle(id).await?;

        {
            let workflow = handle.workflow.read().await;
            if workflow.status() == WorkflowStatus::Running {
                return Err(WorkflowError::invalid_state(format!(
                    "workflow '{}' is still running",
                    id
                )));
            }
        }

        self.workflows.write().await.remove(id);
        Ok(())
    }

    /// Request cancellation of every Running workflow and clear the
    /// registry. In-flight batches finish naturally.
    pub async fn shutdown(&self) {
        let handles: Vec<Arc<WorkflowHandle>> =
            self.workflows.read().await.values().cloned().collect();

        for handle in handles {
            let workflow = handle.workflow.read().await;
            if workflow.status() == WorkflowStatus::Running {
                handle.cancelled.store(true, Ordering::SeqCst);
            }
        }

        self.workflows.write().await.clear();
        info!("Workflow engine shut down");
    }

    async fn handle(&self, id: &WorkflowId) -> Result<Arc<WorkflowHandle>, WorkflowError> {
        self.workflows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::not_found(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::context::ResolutionPolicy;
    use crate::domain::workflow::executor::mock::{MockExecutor, MockOutcome};
    use serde_json::json;

    fn sid(id: &str) -> StepId {
        StepId::new(id).unwrap()
    }

    fn step(id: &str) -> StepDescriptor {
        StepDescriptor::new(sid(id), id.to_uppercase(), "mock")
    }

    fn engine_with(executor: Arc<MockExecutor>, config: EngineConfig) -> WorkflowEngine {
        let mut registry = ExecutorRegistry::new();
        registry.register(executor);
        WorkflowEngine::new(Arc::new(registry), config)
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            default_timeout_ms: 1_000,
            default_max_retries: 0,
            resolution_policy: ResolutionPolicy::Permissive,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_executor_kind() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let steps = vec![StepDescriptor::new(sid("a"), "A", "no-such-kind")];
        let err = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::UnknownExecutor { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_cyclic_graph() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let steps = vec![
            step("a").depends_on(sid("b")),
            step("b").depends_on(sid("a")),
        ];
        let err = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Graph(_)));
    }

    #[tokio::test]
    async fn test_empty_workflow_completes_immediately() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let id = engine
            .create_workflow("empty", vec![], Value::Null)
            .await
            .unwrap();
        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.summary.total, 0);
        assert!(result.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_linear_workflow_with_reference_wiring() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("fetch", MockOutcome::Succeed(json!({"content": "raw data"})));

        let engine = engine_with(Arc::clone(&executor), fast_config());

        let steps = vec![
            step("fetch"),
            step("analyze")
                .with_input("prompt", "${fetch.content}")
                .depends_on(sid("fetch")),
        ];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.summary.completed, 2);
        // The unscripted analyze step echoes its resolved inputs.
        assert_eq!(
            result.results.get(&sid("analyze")),
            Some(&json!({"prompt": "raw data"}))
        );
    }

    #[tokio::test]
    async fn test_fan_in_workflow() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("a", MockOutcome::Succeed(json!({"part": "first"})));
        executor.script("b", MockOutcome::Succeed(json!({"part": "second"})));

        let engine = engine_with(Arc::clone(&executor), fast_config());

        let steps = vec![
            step("a"),
            step("b"),
            step("merge")
                .with_input("left", "${a.part}")
                .with_input("right", "${b.part}")
                .depends_on(sid("a"))
                .depends_on(sid("b")),
        ];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(
            result.results.get(&sid("merge")),
            Some(&json!({"left": "first", "right": "second"}))
        );
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_skips_transitive_dependents() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("a", MockOutcome::Fail("a exploded".to_string()));

        let engine = engine_with(Arc::clone(&executor), fast_config());

        let steps = vec![
            step("a"),
            step("b").depends_on(sid("a")),
            step("c").depends_on(sid("b")),
        ];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Failed);
        let status_of = |id: &str| {
            result
                .steps
                .iter()
                .find(|s| s.id.as_str() == id)
                .unwrap()
                .status
        };
        assert_eq!(status_of("a"), StepStatus::Failed);
        assert_eq!(status_of("b"), StepStatus::Skipped);
        assert_eq!(status_of("c"), StepStatus::Skipped);
        // Only the failing step ever ran.
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_independent_sibling_completes_despite_failure() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("bad", MockOutcome::Fail("boom".to_string()));
        executor.script("good", MockOutcome::Succeed(json!("fine")));

        let engine = engine_with(Arc::clone(&executor), fast_config());

        // Both in batch zero: one fails, the sibling still completes.
        let steps = vec![step("bad"), step("good")];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(result.summary.completed, 1);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.results.get(&sid("good")), Some(&json!("fine")));
    }

    #[tokio::test]
    async fn test_step_retries_up_to_budget() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("flaky", MockOutcome::Fail("try 1".to_string()));
        executor.script("flaky", MockOutcome::Fail("try 2".to_string()));
        executor.script("flaky", MockOutcome::Succeed(json!("third time lucky")));

        let engine = engine_with(Arc::clone(&executor), fast_config());

        let steps = vec![step("flaky").with_max_retries(2)];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_fails_step() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("flaky", MockOutcome::Fail("always".to_string()));

        let engine = engine_with(Arc::clone(&executor), fast_config());

        let steps = vec![step("flaky").with_max_retries(2)];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(executor.call_count(), 3);

        let failed = result.steps.iter().find(|s| s.id == sid("flaky")).unwrap();
        assert!(failed.error.as_deref().unwrap().contains("always"));
    }

    #[tokio::test]
    async fn test_step_timeout_fails_step() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script(
            "slow",
            MockOutcome::Delay(Duration::from_millis(500), json!("too late")),
        );

        let engine = engine_with(Arc::clone(&executor), fast_config());

        let steps = vec![step("slow").with_timeout_ms(50)];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Failed);
        let failed = result.steps.iter().find(|s| s.id == sid("slow")).unwrap();
        assert_eq!(failed.status, StepStatus::Failed);
        assert!(failed.error.as_deref().unwrap().contains("Timeout"));
    }

    #[tokio::test]
    async fn test_strict_resolution_fails_before_dispatch() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script("a", MockOutcome::Succeed(json!({"present": 1})));

        let config = EngineConfig {
            resolution_policy: ResolutionPolicy::Strict,
            ..fast_config()
        };
        let engine = engine_with(Arc::clone(&executor), config);

        let steps = vec![
            step("a"),
            step("b")
                .with_input("x", "${a.absent}")
                .depends_on(sid("a")),
        ];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Failed);
        // The failing step's executor was never invoked.
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_is_single_shot() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let id = engine
            .create_workflow("wf", vec![step("a")], Value::Null)
            .await
            .unwrap();
        engine.execute_workflow(&id).await.unwrap();

        let err = engine.execute_workflow(&id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_cancel_stops_scheduling_later_batches() {
        let executor = Arc::new(MockExecutor::new("mock"));
        executor.script(
            "slow",
            MockOutcome::Delay(Duration::from_millis(200), json!("done")),
        );

        let engine = Arc::new(engine_with(Arc::clone(&executor), fast_config()));

        let steps = vec![step("slow"), step("after").depends_on(sid("slow"))];
        let id = engine
            .create_workflow("wf", steps, Value::Null)
            .await
            .unwrap();

        let runner = {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            tokio::spawn(async move { engine.execute_workflow(&id).await })
        };

        // Let the first batch get in flight, then cancel.
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.cancel_workflow(&id).await.unwrap();

        let result = runner.await.unwrap().unwrap();
        assert_eq!(result.status, WorkflowStatus::Cancelled);

        // The in-flight step finished; the dependent batch never started.
        let slow = result.steps.iter().find(|s| s.id == sid("slow")).unwrap();
        assert_eq!(slow.status, StepStatus::Completed);
        let after = result.steps.iter().find(|s| s.id == sid("after")).unwrap();
        assert_eq!(after.status, StepStatus::Pending);
        assert_eq!(executor.call_count(), 1);

        // The terminal transition waited for the in-flight batch, so the
        // workflow's completion timestamp never precedes its last step's.
        assert!(result.completed_at.unwrap() >= slow.completed_at.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_requires_running_workflow() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let id = engine
            .create_workflow("wf", vec![step("a")], Value::Null)
            .await
            .unwrap();

        let err = engine.cancel_workflow(&id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_status_snapshot_and_listing() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let id = engine
            .create_workflow("wf", vec![step("a")], Value::Null)
            .await
            .unwrap();

        let snapshot = engine.get_workflow_status(&id).await.unwrap();
        assert_eq!(snapshot.status, WorkflowStatus::Pending);
        assert_eq!(engine.list_workflows().await, vec![id.clone()]);

        engine.execute_workflow(&id).await.unwrap();
        let snapshot = engine.get_workflow_status(&id).await.unwrap();
        assert_eq!(snapshot.status, WorkflowStatus::Completed);
    }

    #[tokio::test]
    async fn test_remove_workflow() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        let id = engine
            .create_workflow("wf", vec![step("a")], Value::Null)
            .await
            .unwrap();
        engine.execute_workflow(&id).await.unwrap();

        engine.remove_workflow(&id).await.unwrap();
        assert!(engine.list_workflows().await.is_empty());

        let err = engine.get_workflow_status(&id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_shutdown_clears_registry() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());

        engine
            .create_workflow("wf", vec![step("a")], Value::Null)
            .await
            .unwrap();
        engine.shutdown().await;

        assert!(engine.list_workflows().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_not_found() {
        let engine = engine_with(Arc::new(MockExecutor::new("mock")), fast_config());
        let id = WorkflowId::generate();

        assert!(matches!(
            engine.execute_workflow(&id).await.unwrap_err(),
            WorkflowError::NotFound(_)
        ));
        assert!(matches!(
            engine.remove_workflow(&id).await.unwrap_err(),
            WorkflowError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_shared_context_reaches_executors() {
        let executor = Arc::new(MockExecutor::new("mock"));
        let engine = engine_with(Arc::clone(&executor), fast_config());

        let id = engine
            .create_workflow("wf", vec![step("a")], json!({"caller": "suite"}))
            .await
            .unwrap();
        let result = engine.execute_workflow(&id).await.unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
    }
}
