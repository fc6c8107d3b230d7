// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! slnbake - bootstrap and task runner for .NET solutions
//!
//! A run has three phases:
//!
//! 1. Discover the build layout ([`BuildConfiguration`]) from the working
//!    directory and the command line.
//! 2. Run the setup [`Lifecycle`]: fetch NuGet, fetch vswhere and detect
//!    MSBuild where the host supports it, then freeze the tool registry.
//! 3. Execute the requested target and its dependencies in order.
//!
//! # Example
//!
//! ```ignore
//! let cli = slnbake::cli::Cli::parse();
//! slnbake::run(&cli).await?;
//! ```

// The CLI writes task listings to stdout and errors to stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

/// CLI argument parsing, errors and exit codes.
pub mod cli;
/// Execution planning and sequential task runner.
pub mod executor;
/// NuGet restore invocation and process launching.
pub mod restore;
/// Built-in task table and task bodies.
pub mod tasks;
/// Tracing subscriber setup.
pub mod tracing;

use cli::{Cli, CliError};
use executor::{ExecutionPlan, ExecutionSummary, Executor};
use restore::{ProcessRunner, TokioProcessRunner};
use slnbake_core::{BuildConfiguration, HostCapabilities, Lifecycle, Providers};
use slnbake_tools_github::GitHubReleaseIndex;
use slnbake_tools_url::HttpDownloader;
use slnbake_tools_vswhere::VsWhereLocator;
use std::sync::Arc;
use tasks::TaskContext;

/// Run the CLI against the real network, filesystem and processes.
///
/// # Errors
///
/// Returns a [`CliError`] carrying the exit code category of the failure.
pub async fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.description {
        print!("{}", describe_tasks());
        return Ok(());
    }

    // Resolve the target first so a typo fails before any download.
    let plan = ExecutionPlan::for_target(cli.target())?;

    let working_dir = cli.working_dir()?;
    let config = BuildConfiguration::discover(&working_dir, cli.build_options())?;

    let providers = Providers {
        downloader: Arc::new(HttpDownloader::new()?),
        releases: Arc::new(GitHubReleaseIndex::new()?),
        locator: Arc::new(VsWhereLocator::new()),
    };

    let summary = run_plan(
        &config,
        HostCapabilities::current(),
        providers,
        &TokioProcessRunner,
        &plan,
        cli.dryrun,
    )
    .await?;
    summary.log();
    Ok(())
}

/// Set up tools, run `plan`, then tear down.
///
/// Teardown runs whether or not a task failed. A setup failure aborts
/// before any task runs.
///
/// # Errors
///
/// Returns the setup error or the first task failure.
pub async fn run_plan(
    config: &BuildConfiguration,
    host: HostCapabilities,
    providers: Providers,
    runner: &dyn ProcessRunner,
    plan: &ExecutionPlan,
    dry_run: bool,
) -> Result<ExecutionSummary, CliError> {
    let mut lifecycle = Lifecycle::new(config, host, providers);
    let tools = lifecycle.setup().await?;

    let ctx = TaskContext {
        config,
        tools: &tools,
        host,
        runner,
    };
    let result = Executor::new(ctx).dry_run(dry_run).execute(plan).await;

    lifecycle.teardown();
    Ok(result?)
}

/// Task listing printed by `--description`.
#[must_use]
pub fn describe_tasks() -> String {
    let width = tasks::TASKS
        .iter()
        .map(|task| task.name.len())
        .max()
        .unwrap_or(0);

    tasks::TASKS
        .iter()
        .map(|task| {
            let mut line = format!("{:width$}  {}", task.name, task.description);
            if !task.depends_on.is_empty() {
                line.push_str(&format!(" (depends on: {})", task.depends_on.join(", ")));
            }
            if !task.aliases.is_empty() {
                line.push_str(&format!(" [aliases: {}]", task.aliases.join(", ")));
            }
            line.push('\n');
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_every_task() {
        let listing = describe_tasks();
        assert_eq!(listing.lines().count(), 3);
        assert!(listing.contains("NuGetRestore"));
        assert!(listing.contains("depends on: Clean"));
        assert!(listing.contains("aliases: Restore"));
    }

    #[test]
    fn test_describe_aligns_descriptions() {
        let listing = describe_tasks();
        let column = "NuGetRestore".len() + 2;
        for (line, task) in listing.lines().zip(&tasks::TASKS) {
            assert_eq!(&line[column..column + task.description.len()], task.description);
        }
    }
}
