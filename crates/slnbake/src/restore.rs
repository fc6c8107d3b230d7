//! NuGet restore invocation.

use async_trait::async_trait;
use slnbake_core::tools::ToolRegistry;
use slnbake_core::{BuildConfiguration, Error, HostCapabilities, Os, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Parameter naming the MSBuild directory NuGet should use.
pub const MSBUILD_PATH_PARAM: &str = "-MSBuildPath";

/// Runtime used to launch `nuget.exe` outside Windows.
pub const MONO: &str = "mono";

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to launch.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Value following `flag` in the arguments, if present.
    #[must_use]
    pub fn arg_value(&self, flag: &str) -> Option<&OsString> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.args.get(i + 1))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Launches external processes and waits for them.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` in `cwd` with inherited stdio.
    ///
    /// # Errors
    ///
    /// Returns a subprocess error if the program cannot start or exits
    /// unsuccessfully.
    async fn run(&self, invocation: &Invocation, cwd: &Path) -> Result<()>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation, cwd: &Path) -> Result<()> {
        info!(command = %invocation, "Running");

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(cwd)
            .status()
            .await
            .map_err(|e| {
                Error::subprocess(format!(
                    "Failed to start {}: {e}",
                    invocation.program.display()
                ))
            })?;

        if !status.success() {
            return Err(Error::subprocess(format!(
                "{} exited with {status}",
                invocation.program.display()
            )));
        }
        Ok(())
    }
}

/// Build the restore command for the solution.
///
/// `-MSBuildPath <dir>` is passed only when restore should use MSBuild and an
/// MSBuild path was resolved during setup.
///
/// # Errors
///
/// Returns a task error if NuGet was not resolved.
pub fn restore_invocation(
    config: &BuildConfiguration,
    tools: &ToolRegistry,
    host: HostCapabilities,
) -> Result<Invocation> {
    let nuget = tools
        .restore_tool()
        .path()
        .ok_or_else(|| Error::task(crate::tasks::RESTORE, "NuGet path is not resolved"))?;

    let mut args: Vec<OsString> = vec!["restore".into(), config.solution().into()];

    match (config.use_build_tool_for_restore(), tools.build_tool().containing_dir()) {
        (true, Some(dir)) => {
            debug!(msbuild_dir = %dir.display(), "Restoring with MSBuild");
            args.push(MSBUILD_PATH_PARAM.into());
            args.push(dir.into());
        }
        (true, None) => debug!("MSBuild not resolved, restoring without it"),
        (false, _) => {}
    }

    Ok(if host.os == Os::Windows {
        Invocation {
            program: nuget.to_path_buf(),
            args,
        }
    } else {
        let mut mono_args = vec![nuget.as_os_str().to_os_string()];
        mono_args.extend(args);
        Invocation {
            program: PathBuf::from(MONO),
            args: mono_args,
        }
    })
}
