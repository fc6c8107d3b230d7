//! Plans and runs a target with its dependencies.

use crate::tasks::{self, TaskContext, TaskDefinition};
use slnbake_core::{Error, Result};
use slnbake_task_graph::TaskGraph;
use std::time::{Duration, Instant};
use tracing::{Instrument, info, info_span};

/// Tasks to run for a target, dependencies first, each exactly once.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    tasks: Vec<TaskDefinition>,
}

impl ExecutionPlan {
    /// Build the plan for `target` (name or alias, any case).
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for an unknown target, and a graph error if
    /// the task table is inconsistent.
    pub fn for_target(target: &str) -> slnbake_task_graph::Result<Self> {
        let root = tasks::find_task(target).ok_or_else(|| {
            slnbake_task_graph::Error::task_not_found(target, &tasks::task_names())
        })?;

        let mut graph = TaskGraph::new();
        graph.build_for_task(root.name, |name| tasks::find_task(name).cloned())?;
        let tasks = graph
            .topological_sort()?
            .into_iter()
            .map(|node| node.task)
            .collect();

        Ok(Self { tasks })
    }

    /// Tasks in run order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Task names in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|task| task.name).collect()
    }
}

/// How long each task took.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    /// `(task, duration)` in run order.
    pub entries: Vec<(&'static str, Duration)>,
    /// Whether bodies were skipped.
    pub dry_run: bool,
}

impl ExecutionSummary {
    /// Names of the tasks that ran, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Sum of all task durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, d)| *d).sum()
    }

    /// Log one line per task plus the total.
    pub fn log(&self) {
        for (name, duration) in &self.entries {
            info!(task = name, duration_ms = duration.as_millis(), "Task summary");
        }
        info!(
            tasks = self.entries.len(),
            total_ms = self.total().as_millis(),
            dry_run = self.dry_run,
            "Run complete"
        );
    }
}

/// Runs plans sequentially against one task context.
pub struct Executor<'a> {
    ctx: TaskContext<'a>,
    dry_run: bool,
}

impl<'a> Executor<'a> {
    /// Create an executor.
    #[must_use]
    pub fn new(ctx: TaskContext<'a>) -> Self {
        Self {
            ctx,
            dry_run: false,
        }
    }

    /// Log tasks instead of running their bodies.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every task of `plan` in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Task`] naming the first task whose body failed.
    pub async fn execute(&self, plan: &ExecutionPlan) -> Result<ExecutionSummary> {
        let mut summary = ExecutionSummary {
            entries: Vec::with_capacity(plan.tasks().len()),
            dry_run: self.dry_run,
        };

        for task in plan.tasks() {
            let span = info_span!("task", name = task.name);
            let started = Instant::now();

            if self.dry_run {
                let _guard = span.enter();
                info!(depends_on = ?task.depends_on, "Would run task");
            } else {
                self.run_task(task).instrument(span).await?;
            }

            summary.entries.push((task.name, started.elapsed()));
        }

        Ok(summary)
    }

    async fn run_task(&self, task: &TaskDefinition) -> Result<()> {
        info!("Starting task");
        tasks::run_action(task, self.ctx).await.map_err(|e| match e {
            Error::Task { .. } => e,
            other => Error::task(task.name, other.to_string()),
        })?;
        info!("Finished task");
        Ok(())
    }
}
