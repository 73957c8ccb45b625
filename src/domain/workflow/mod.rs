//! Workflow domain: steps, dependency graphs, references, and the
//! executor contract.

pub mod context;
pub mod entity;
pub mod error;
pub mod executor;
pub mod graph;
pub mod reference;
pub mod result;
pub mod step;

pub use context::{ResolutionPolicy, WorkflowContext};
pub use entity::{Workflow, WorkflowId, WorkflowStatus};
pub use error::{GraphError, WorkflowError};
pub use executor::{ExecutorRegistry, StepExecutor};
pub use graph::DependencyGraph;
pub use reference::{extract_references, StepReference};
pub use result::{StepReport, WorkflowResult, WorkflowSummary};
pub use step::{StepDescriptor, StepId, StepStatus, MAX_ID_LENGTH};
