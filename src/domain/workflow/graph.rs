//! Dependency graph validation and batch scheduling
//!
//! The graph is validated and layered once at workflow construction. The
//! batch schedule is computed by iterative topological reduction (Kahn's
//! algorithm, layer by layer) rather than recursive traversal, so deep
//! graphs cannot grow the stack.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::error::GraphError;
use super::reference::extract_references;
use super::step::{StepDescriptor, StepId};

/// Validated dependency graph with a precomputed batch schedule.
///
/// Batch `k` is exactly the set of steps whose dependencies all appear in
/// batches `0..k`. Steps within one batch have no ordering among
/// themselves.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// dependency -> direct dependents
    dependents: BTreeMap<StepId, BTreeSet<StepId>>,
    /// Layered execution order
    batches: Vec<Vec<StepId>>,
}

impl DependencyGraph {
    /// Build and validate the graph for a set of steps.
    ///
    /// Fails with a [`GraphError`] on duplicate ids, dependencies on
    /// unknown steps, input references that are not backed by a declared
    /// dependency, or cycles.
    pub fn build(steps: &[StepDescriptor]) -> Result<Self, GraphError> {
        let mut known: BTreeSet<StepId> = BTreeSet::new();

        for step in steps {
            if !known.insert(step.id().clone()) {
                return Err(GraphError::DuplicateStep(step.id().to_string()));
            }
        }

        let mut dependents: BTreeMap<StepId, BTreeSet<StepId>> = BTreeMap::new();
        let mut indegree: BTreeMap<StepId, usize> = BTreeMap::new();

        for step in steps {
            indegree.entry(step.id().clone()).or_insert(0);

            for dependency in step.dependencies() {
                if !known.contains(dependency) {
                    return Err(GraphError::DanglingDependency {
                        step: step.id().to_string(),
                        dependency: dependency.to_string(),
                    });
                }

                dependents
                    .entry(dependency.clone())
                    .or_default()
                    .insert(step.id().clone());
                *indegree.entry(step.id().clone()).or_insert(0) += 1;
            }

            // References alone are insufficient as ordering declarations,
            // but every reference must still point at a declared dependency.
            for (_, value) in step.inputs() {
                for reference in extract_references(value) {
                    if !step.dependencies().contains(reference.step()) {
                        return Err(GraphError::UndeclaredReference {
                            step: step.id().to_string(),
                            target: reference.step().to_string(),
                        });
                    }
                }
            }
        }

        let batches = layer(&dependents, indegree)?;

        Ok(Self {
            dependents,
            batches,
        })
    }

    /// The layered execution order
    pub fn batches(&self) -> &[Vec<StepId>] {
        &self.batches
    }

    /// Direct dependents of a step
    pub fn dependents_of(&self, id: &StepId) -> Option<&BTreeSet<StepId>> {
        self.dependents.get(id)
    }

    /// All transitive dependents of the given steps. Used for skip
    /// propagation when a step fails.
    pub fn transitive_dependents(&self, roots: &BTreeSet<StepId>) -> BTreeSet<StepId> {
        let mut reached = BTreeSet::new();
        let mut queue: VecDeque<&StepId> = roots.iter().collect();

        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.dependents.get(current) {
                for child in children {
                    if reached.insert(child.clone()) {
                        queue.push_back(child);
                    }
                }
            }
        }

        reached
    }
}

/// Layered Kahn reduction. Each pass strips the current zero-indegree
/// frontier; if a pass makes no progress while nodes remain, those nodes
/// form a cycle.
fn layer(
    dependents: &BTreeMap<StepId, BTreeSet<StepId>>,
    mut indegree: BTreeMap<StepId, usize>,
) -> Result<Vec<Vec<StepId>>, GraphError> {
    let mut batches = Vec::new();

    while !indegree.is_empty() {
        let frontier: Vec<StepId> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| id.clone())
            .collect();

        if frontier.is_empty() {
            let remaining: Vec<String> =
                indegree.keys().map(|id| id.to_string()).collect();
            return Err(GraphError::Cycle(remaining.join(", ")));
        }

        for id in &frontier {
            indegree.remove(id);

            if let Some(children) = dependents.get(id) {
                for child in children {
                    if let Some(degree) = indegree.get_mut(child) {
                        *degree -= 1;
                    }
                }
            }
        }

        batches.push(frontier);
    }

    Ok(batches)
}
