//! Step executor contract and registry

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::error::WorkflowError;
use super::step::StepDescriptor;

/// Executes one kind of workflow step.
///
/// Implementations receive the step's already-resolved inputs and the
/// workflow's shared context, and return an opaque JSON result.
#[async_trait]
pub trait StepExecutor: Send + Sync + Debug {
    /// The executor kind this implementation handles
    fn kind(&self) -> &str;

    /// Whether this executor can handle the given step
    fn can_handle(&self, step: &StepDescriptor) -> bool {
        step.executor_kind() == self.kind()
    }

    /// Execute a step with resolved inputs
    async fn execute(
        &self,
        step: &StepDescriptor,
        inputs: &BTreeMap<String, Value>,
        shared_context: &Value,
    ) -> Result<Value, WorkflowError>;
}

/// Registry mapping executor kinds to implementations
#[derive(Debug, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn StepExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its kind. A later registration for the
    /// same kind replaces the earlier one.
    pub fn register(&mut self, executor: Arc<dyn StepExecutor>) {
        self.executors.insert(executor.kind().to_string(), executor);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn StepExecutor>> {
        self.executors.get(kind).cloned()
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.executors.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.executors.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted executor for engine tests

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Outcome script for a single invocation
    #[derive(Debug, Clone)]
    pub enum MockOutcome {
        Succeed(Value),
        Fail(String),
        /// Sleep, then succeed. Used to exercise timeouts.
        Delay(Duration, Value),
    }

    /// Executor that replays a queue of scripted outcomes per step id.
    /// Steps with no script echo their resolved inputs.
    #[derive(Debug)]
    pub struct MockExecutor {
        kind: String,
        scripts: Mutex<BTreeMap<String, Vec<MockOutcome>>>,
        call_count: AtomicUsize,
    }

    impl MockExecutor {
        pub fn new(kind: impl Into<String>) -> Self {
            Self {
                kind: kind.into(),
                scripts: Mutex::new(BTreeMap::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Queue an outcome for the named step. Outcomes replay in order;
        /// the final outcome repeats once the queue is drained.
        pub fn script(&self, step_id: &str, outcome: MockOutcome) {
            self.scripts
                .lock()
                .unwrap()
                .entry(step_id.to_string())
                .or_default()
                .push(outcome);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn next_outcome(&self, step_id: &str) -> Option<MockOutcome> {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts.get_mut(step_id)?;

            if queue.len() > 1 {
                Some(queue.remove(0))
            } else {
                queue.first().cloned()
            }
        }
    }

    #[async_trait]
    impl StepExecutor for MockExecutor {
        fn kind(&self) -> &str {
            &self.kind
        }

        async fn execute(
            &self,
            step: &StepDescriptor,
            inputs: &BTreeMap<String, Value>,
            _shared_context: &Value,
        ) -> Result<Value, WorkflowError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            match self.next_outcome(step.id().as_str()) {
                Some(MockOutcome::Succeed(value)) => Ok(value),
                Some(MockOutcome::Fail(message)) => {
                    Err(WorkflowError::step_execution(step.id().as_str(), message))
                }
                Some(MockOutcome::Delay(duration, value)) => {
                    tokio::time::sleep(duration).await;
                    Ok(value)
                }
                None => Ok(serde_json::to_value(inputs)
                    .map_err(|e| WorkflowError::step_execution(step.id().as_str(), e.to_string()))?),
            }
        }
    }
}
