//! Workflow error types

use thiserror::Error;

/// Construction-time graph validation failures.
///
/// These are always synchronous and fatal to the call that produced them;
/// they never appear mid-execution.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    DanglingDependency { step: String, dependency: String },

    #[error("Step '{step}' references '{target}' which is not a declared dependency")]
    UndeclaredReference { step: String, target: String },

    #[error("Dependency cycle involving steps: {0}")]
    Cycle(String),
}

/// Errors that can occur during workflow operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("No executor registered for kind '{kind}' (step '{step}')")]
    UnknownExecutor { step: String, kind: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Step execution failed in '{step}': {message}")]
    StepExecution { step: String, message: String },

    #[error("Timeout in step '{step}' after {timeout_ms}ms")]
    StepTimeout { step: String, timeout_ms: u64 },

    #[error("Reference resolution failed in step '{step}': {message}")]
    ReferenceResolution { step: String, message: String },

    #[error("Invalid workflow state: {0}")]
    InvalidState(String),
}

impl WorkflowError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn unknown_executor(step: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownExecutor {
            step: step.into(),
            kind: kind.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn step_execution(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepExecution {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn step_timeout(step: impl Into<String>, timeout_ms: u64) -> Self {
        Self::StepTimeout {
            step: step.into(),
            timeout_ms,
        }
    }

    pub fn reference_resolution(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReferenceResolution {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkflowError::not_found("test-workflow");
        assert_eq!(err.to_string(), "Workflow not found: test-workflow");

        let err = WorkflowError::step_execution("step1", "Connection failed");
        assert_eq!(
            err.to_string(),
            "Step execution failed in 'step1': Connection failed"
        );

        let err = WorkflowError::step_timeout("slow-step", 5000);
        assert_eq!(err.to_string(), "Timeout in step 'slow-step' after 5000ms");
    }

    #[test]
    fn test_graph_error_conversion() {
        let graph_err = GraphError::DanglingDependency {
            step: "b".to_string(),
            dependency: "missing".to_string(),
        };

        let err: WorkflowError = graph_err.clone().into();
        assert_eq!(err, WorkflowError::Graph(graph_err));
        assert_eq!(
            err.to_string(),
            "Step 'b' depends on unknown step 'missing'"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = WorkflowError::not_found("test");
        let err2 = WorkflowError::not_found("test");
        assert_eq!(err1, err2);

        let err3 = WorkflowError::not_found("other");
        assert_ne!(err1, err3);
    }
}
