use crate::tracing::{LogFormat, LogLevel};
use clap::{ArgAction, Parser};
use miette::{Diagnostic, Report};
use serde::Serialize;
use slnbake_core::config::DEFAULT_CONFIGURATION;
use slnbake_core::{BuildOptions, ToolOverrides};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Tool, task or unexpected error exit code
pub const EXIT_FAILURE: i32 = 3;

/// Target run when none is given.
pub const DEFAULT_TARGET: &str = "Default";

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(slnbake::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Tool acquisition or detection error (exit code 3)
    #[error("Tool error: {message}")]
    #[diagnostic(code(slnbake::cli::tool))]
    Tool {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// A task body failed (exit code 3)
    #[error("Task '{task}' failed: {message}")]
    #[diagnostic(code(slnbake::cli::task))]
    Task {
        /// Name of the failing task
        task: String,
        /// The error message
        message: String,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(slnbake::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new tool error
    #[must_use]
    pub fn tool(message: impl Into<String>, help: Option<String>) -> Self {
        Self::Tool {
            message: message.into(),
            help,
        }
    }

    /// Create a new task error
    #[must_use]
    pub fn task(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Task {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Short category name used in JSON output.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Tool { .. } => "tool",
            Self::Task { .. } => "task",
            Self::Other { .. } => "other",
        }
    }
}

/// Convert `slnbake_core::Error` to appropriate `CliError` variant.
///
/// - Configuration errors -> Config (exit code 2)
/// - Network, release, locator and parse errors -> Tool (exit code 3)
/// - Task body errors -> Task (exit code 3)
/// - I/O errors -> Other (exit code 3)
impl From<slnbake_core::Error> for CliError {
    fn from(err: slnbake_core::Error) -> Self {
        use slnbake_core::Error;

        match err {
            Error::Configuration { message, help } => Self::Config { message, help },
            Error::Network { message, help } => Self::tool(message, help),
            Error::NotFound { .. } | Error::Subprocess { .. } | Error::Parse { .. } => {
                Self::tool(err.to_string(), None)
            }
            Error::AssetIndexOutOfRange { .. } => Self::tool(
                err.to_string(),
                Some("The upstream release layout changed; review the configured asset index".into()),
            ),
            Error::Task { task, message } => Self::task(task, message),
            Error::Io {
                source,
                path,
                operation,
            } => {
                let path_str = path
                    .as_ref()
                    .map_or(String::new(), |p| format!(" on {}", p.display()));
                Self::other_with_help(
                    format!("I/O {operation} failed{path_str}: {source}"),
                    "Check file permissions and ensure the path exists",
                )
            }
        }
    }
}

/// Convert task-graph errors. An unknown target is a usage error.
impl From<slnbake_task_graph::Error> for CliError {
    fn from(err: slnbake_task_graph::Error) -> Self {
        use slnbake_task_graph::Error;

        match err {
            Error::TaskNotFound { name, available } => {
                let message = format!("Task '{name}' not found");
                match available {
                    Some(help) => Self::config_with_help(message, help),
                    None => Self::config(message),
                }
            }
            Error::CycleDetected { .. } | Error::MissingDependencies { .. } => {
                Self::other(err.to_string())
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Tool { .. } | CliError::Task { .. } | CliError::Other { .. } => EXIT_FAILURE,
    }
}

/// JSON error envelope written when logs are JSON.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    status: &'static str,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
}

/// Render error appropriately based on the log format
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let help = match err {
            CliError::Config { help, .. }
            | CliError::Tool { help, .. }
            | CliError::Other { help, .. } => help.as_deref(),
            CliError::Task { .. } => None,
        };
        let envelope = ErrorEnvelope {
            status: "error",
            code: err.category(),
            message: err.to_string(),
            help,
        };
        match serde_json::to_string(&envelope) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
    }
    let _ = io::stderr().flush();
}

/// Main CLI entry point for slnbake.
///
/// Bootstraps the tools a .NET solution build needs and runs a named target.
#[derive(Parser, Debug)]
#[command(name = "slnbake")]
#[command(
    about = "Bootstrap NuGet and MSBuild for a .NET solution, then clean and restore it"
)]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Task to run (positional form).
    #[arg(value_name = "TARGET", conflicts_with = "target_flag")]
    pub target: Option<String>,

    /// Task to run.
    #[arg(long = "target", short = 't', value_name = "TARGET")]
    pub target_flag: Option<String>,

    /// Build configuration name.
    #[arg(long, default_value = DEFAULT_CONFIGURATION)]
    pub config: String,

    /// Explicit MSBuild executable; disables detection.
    #[arg(long, env = "SLNBAKE_MSBUILD_PATH", value_name = "PATH")]
    pub msbuildpath: Option<PathBuf>,

    /// Explicit NuGet executable; disables download.
    #[arg(long, env = "SLNBAKE_NUGET_PATH", value_name = "PATH")]
    pub nugetpath: Option<PathBuf>,

    /// Explicit vswhere executable; disables download.
    #[arg(long, env = "SLNBAKE_VSWHERE_PATH", value_name = "PATH")]
    pub vswherepath: Option<PathBuf>,

    /// Pass the MSBuild directory to NuGet restore.
    #[arg(
        long,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub usemsbuildfornuget: bool,

    /// Working directory (defaults to the parent of the current directory).
    #[arg(long, value_name = "DIR")]
    pub working: Option<PathBuf>,

    /// Show the execution plan without running task bodies.
    #[arg(long)]
    pub dryrun: bool,

    /// List available tasks and exit.
    #[arg(long)]
    pub description: bool,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        help = "Set logging level",
        default_value = "info",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long = "log-format", default_value = "pretty", value_enum)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Requested target, falling back to [`DEFAULT_TARGET`].
    #[must_use]
    pub fn target(&self) -> &str {
        self.target_flag
            .as_deref()
            .or(self.target.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TARGET)
    }

    /// Whether errors should be rendered as JSON.
    #[must_use]
    pub fn json_mode(&self) -> bool {
        matches!(self.log_format, LogFormat::Json)
    }

    /// Directory the build operates in.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the current directory is unreadable.
    pub fn working_dir(&self) -> Result<PathBuf, CliError> {
        if let Some(dir) = &self.working {
            return Ok(dir.clone());
        }
        let cwd = std::env::current_dir()
            .map_err(|e| CliError::config(format!("Cannot read current directory: {e}")))?;
        Ok(cwd.parent().map_or_else(|| cwd.clone(), PathBuf::from))
    }

    /// Options handed to build discovery.
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            configuration: self.config.clone(),
            overrides: ToolOverrides {
                build_tool: self.msbuildpath.clone(),
                restore_tool: self.nugetpath.clone(),
                locator_tool: self.vswherepath.clone(),
            },
            use_build_tool_for_restore: self.usemsbuildfornuget,
        }
    }
}
