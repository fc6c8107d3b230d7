//! Built-in tasks and their bodies.
//!
//! ```text
//! Clean <- NuGetRestore <- Default
//! ```

use crate::restore::{ProcessRunner, restore_invocation};
use slnbake_core::{BuildConfiguration, Error, HostCapabilities, Result};
use slnbake_core::tools::ToolRegistry;
use slnbake_task_graph::TaskNodeData;
use std::path::Path;
use tracing::{debug, info};

/// Name of the clean task.
pub const CLEAN: &str = "Clean";
/// Canonical name of the restore task.
pub const RESTORE: &str = "NuGetRestore";
/// Name of the default target.
pub const DEFAULT: &str = "Default";

/// What a task does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Delete bin and obj directories.
    Clean,
    /// Run the restore tool against the solution.
    Restore,
    /// Nothing; exists to pull in its dependencies.
    Noop,
}

/// A named task and its declared predecessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    /// Canonical name.
    pub name: &'static str,
    /// Other accepted names.
    pub aliases: &'static [&'static str],
    /// Tasks that must run first.
    pub depends_on: &'static [&'static str],
    /// One-line summary shown by `--description`.
    pub description: &'static str,
    /// Body.
    pub action: TaskAction,
}

impl TaskDefinition {
    /// Whether `name` refers to this task, ignoring ASCII case.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

impl TaskNodeData for TaskDefinition {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.depends_on.iter().copied()
    }
}

/// Every task slnbake knows.
pub const TASKS: [TaskDefinition; 3] = [
    TaskDefinition {
        name: CLEAN,
        aliases: &[],
        depends_on: &[],
        description: "Delete bin and obj directories of the solution",
        action: TaskAction::Clean,
    },
    TaskDefinition {
        name: RESTORE,
        aliases: &["Restore"],
        depends_on: &[CLEAN],
        description: "Restore NuGet packages for the solution",
        action: TaskAction::Restore,
    },
    TaskDefinition {
        name: DEFAULT,
        aliases: &[],
        depends_on: &[RESTORE],
        description: "Clean, then restore",
        action: TaskAction::Noop,
    },
];

/// Look up a task by name or alias.
#[must_use]
pub fn find_task(name: &str) -> Option<&'static TaskDefinition> {
    TASKS.iter().find(|task| task.answers_to(name))
}

/// Canonical names of all tasks.
#[must_use]
pub fn task_names() -> Vec<&'static str> {
    TASKS.iter().map(|task| task.name).collect()
}

/// Everything a task body may read.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    /// Discovered build layout and options.
    pub config: &'a BuildConfiguration,
    /// Tools resolved during setup.
    pub tools: &'a ToolRegistry,
    /// Host the run happens on.
    pub host: HostCapabilities,
    /// Launches external processes.
    pub runner: &'a dyn ProcessRunner,
}

/// Run the body of `task`.
///
/// # Errors
///
/// Returns whatever the body fails with; the executor attributes it to the
/// task.
pub async fn run_action(task: &TaskDefinition, ctx: TaskContext<'_>) -> Result<()> {
    match task.action {
        TaskAction::Clean => clean(ctx.config).await,
        TaskAction::Restore => {
            let invocation = restore_invocation(ctx.config, ctx.tools, ctx.host)?;
            ctx.runner.run(&invocation, ctx.config.working_dir()).await
        }
        TaskAction::Noop => Ok(()),
    }
}

/// Delete every bin directory, then every obj directory.
///
/// # Errors
///
/// Returns an I/O error if a directory exists but cannot be removed.
pub async fn clean(config: &BuildConfiguration) -> Result<()> {
    info!(count = config.bin_paths().len(), "Deleting bin directories");
    for dir in config.bin_paths() {
        remove_dir(dir).await?;
    }

    info!(count = config.obj_paths().len(), "Deleting obj directories");
    for dir in config.obj_paths() {
        remove_dir(dir).await?;
    }
    Ok(())
}

async fn remove_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!(path = %dir.display(), "Deleted directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %dir.display(), "Directory already absent");
            Ok(())
        }
        Err(e) => Err(Error::io(e, Some(dir.to_path_buf()), "delete directory")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slnbake_core::BuildOptions;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_ignores_case_and_accepts_alias() {
        assert_eq!(find_task("clean").unwrap().name, CLEAN);
        assert_eq!(find_task("NUGETRESTORE").unwrap().name, RESTORE);
        assert_eq!(find_task("Restore").unwrap().name, RESTORE);
        assert_eq!(find_task("restore").unwrap().name, RESTORE);
        assert_eq!(find_task("default").unwrap().name, DEFAULT);
        assert!(find_task("Build").is_none());
    }

    #[test]
    fn test_declared_dependencies() {
        assert!(find_task(CLEAN).unwrap().depends_on.is_empty());
        assert_eq!(find_task(RESTORE).unwrap().depends_on, &[CLEAN]);
        assert_eq!(find_task(DEFAULT).unwrap().depends_on, &[RESTORE]);
        assert_eq!(task_names(), vec![CLEAN, RESTORE, DEFAULT]);
    }

    #[tokio::test]
    async fn test_clean_skips_build_area() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("Foo.sln"), "").unwrap();
        std::fs::create_dir_all(root.join("src/Foo.Test")).unwrap();
        std::fs::write(root.join("src/Foo.Test/Foo.Test.csproj"), "").unwrap();
        for dir in ["src/Foo/bin/Release", "src/Foo/obj", "build/tmp/bin"] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
        std::fs::write(root.join("src/Foo/bin/Release/Foo.dll"), "").unwrap();

        let config = BuildConfiguration::discover(root, BuildOptions::default()).unwrap();
        clean(&config).await.unwrap();

        assert!(!root.join("src/Foo/bin").exists());
        assert!(!root.join("src/Foo/obj").exists());
        assert!(root.join("build/tmp/bin").is_dir());
        assert!(root.join("src/Foo").is_dir());

        // Running again with the directories gone is fine.
        clean(&config).await.unwrap();
    }
}
