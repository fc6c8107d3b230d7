//! Task dependency graph and execution ordering for slnbake.
//!
//! This crate provides a directed acyclic graph (DAG) of named tasks using
//! petgraph. Given a requested target it collects the target's transitive
//! dependencies and yields them in an order where every task comes after the
//! tasks it depends on.
//!
//! # Example
//!
//! ```ignore
//! use slnbake_task_graph::{TaskGraph, TaskNodeData};
//!
//! #[derive(Clone)]
//! struct Step {
//!     depends_on: Vec<String>,
//! }
//!
//! impl TaskNodeData for Step {
//!     fn dependency_names(&self) -> impl Iterator<Item = &str> {
//!         self.depends_on.iter().map(String::as_str)
//!     }
//! }
//!
//! let mut graph = TaskGraph::new();
//! graph.build_for_task("Default", |name| steps.get(name).cloned())?;
//! let order = graph.topological_sort()?;
//! ```

mod error;
mod graph;

pub use error::{Error, Result};
pub use graph::{GraphNode, TaskGraph};

/// Trait for task data that can be stored in the task graph.
pub trait TaskNodeData: Clone {
    /// Names of the tasks this task depends on.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;
}
