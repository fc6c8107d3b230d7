//! Error types for task graph operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected in task graph: {message}")]
    #[diagnostic(code(slnbake::task_graph::cycle))]
    CycleDetected {
        /// Human-readable description of the cycle.
        message: String,
    },

    /// Tasks depend on tasks that don't exist.
    #[error("Missing dependencies: {}", describe_missing(.missing))]
    #[diagnostic(code(slnbake::task_graph::missing_dependency))]
    MissingDependencies {
        /// List of (task, missing_dependency) pairs.
        missing: Vec<(String, String)>,
    },

    /// The requested target does not exist.
    #[error("Task '{name}' not found")]
    #[diagnostic(code(slnbake::task_graph::not_found))]
    TaskNotFound {
        /// The requested name.
        name: String,
        /// Names that do exist.
        #[help]
        available: Option<String>,
    },
}

impl Error {
    /// Create a task-not-found error listing the tasks that exist.
    #[must_use]
    pub fn task_not_found(name: impl Into<String>, available: &[&str]) -> Self {
        Self::TaskNotFound {
            name: name.into(),
            available: (!available.is_empty())
                .then(|| format!("Available tasks: {}", available.join(", "))),
        }
    }
}

fn describe_missing(missing: &[(String, String)]) -> String {
    missing
        .iter()
        .map(|(task, dep)| format!("Task '{task}' depends on missing task '{dep}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
