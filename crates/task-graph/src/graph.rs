//! Dependency graph of named tasks, backed by petgraph.
//!
//! Edges run from a dependency to its dependent, so the topological order
//! puts every task after the tasks it needs.

use crate::{Error, Result, TaskNodeData};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

/// A task stored in the graph under its name.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Name of the task.
    pub name: String,
    /// The task data.
    pub task: T,
}

/// Graph of tasks reachable from one or more requested targets.
pub struct TaskGraph<T: TaskNodeData> {
    graph: DiGraph<GraphNode<T>, ()>,
    by_name: HashMap<String, NodeIndex>,
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            by_name: HashMap::new(),
        }
    }

    /// Insert `task` under `name`. A name that is already present keeps its
    /// first task.
    pub fn add_task(&mut self, name: &str, task: T) -> NodeIndex {
        *self.by_name.entry(name.to_string()).or_insert_with(|| {
            debug!(task = name, "Adding task node");
            self.graph.add_node(GraphNode {
                name: name.to_string(),
                task,
            })
        })
    }

    /// Connect every task to the tasks it depends on.
    ///
    /// Repeated dependencies produce a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependencies`] listing every dependency that
    /// names a task not in the graph. No edges are added in that case.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut edges = Vec::new();
        let mut missing = Vec::new();

        for dependent in self.graph.node_indices() {
            let node = &self.graph[dependent];
            for dep in node.task.dependency_names() {
                match self.by_name.get(dep) {
                    Some(&dependency) => edges.push((dependency, dependent)),
                    None => missing.push((node.name.clone(), dep.to_string())),
                }
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingDependencies { missing });
        }

        for (dependency, dependent) in edges {
            self.graph.update_edge(dependency, dependent, ());
        }
        Ok(())
    }

    /// Populate the graph with `target` and everything it depends on,
    /// looking tasks up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if `lookup` does not know `target`,
    /// and [`Error::MissingDependencies`] if a dependency cannot be found.
    pub fn build_for_task<F>(&mut self, target: &str, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<T>,
    {
        debug!(target, "Collecting task closure");

        let root = lookup(target).ok_or_else(|| Error::task_not_found(target, &[]))?;
        let mut pending = vec![(target.to_string(), root)];

        while let Some((name, task)) = pending.pop() {
            if self.by_name.contains_key(&name) {
                continue;
            }
            let deps: Vec<String> = task.dependency_names().map(str::to_string).collect();
            self.add_task(&name, task);

            for dep in deps {
                if self.by_name.contains_key(&dep) {
                    continue;
                }
                // Unknown dependencies are reported together by add_dependency_edges.
                if let Some(found) = lookup(&dep) {
                    pending.push((dep, found));
                }
            }
        }

        self.add_dependency_edges()
    }

    /// Tasks in execution order, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] naming a task on the cycle. A task
    /// that depends on itself is a cycle.
    pub fn topological_sort(&self) -> Result<Vec<GraphNode<T>>> {
        let order = toposort(&self.graph, None).map_err(|cycle| Error::CycleDetected {
            message: format!(
                "task '{}' depends on itself",
                self.graph[cycle.node_id()].name
            ),
        })?;

        Ok(order.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }
}

impl<T: TaskNodeData> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
