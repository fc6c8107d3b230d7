//! Error types for slnbake core operations.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for slnbake core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while discovering the build, acquiring tools or running tasks.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A required solution or project file is missing, or an argument is invalid.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(slnbake::config))]
    Configuration {
        /// Description of the problem.
        message: String,
        /// Optional hint for the user.
        #[help]
        help: Option<String>,
    },

    /// A download or release lookup failed.
    #[error("Network error: {message}")]
    #[diagnostic(code(slnbake::network))]
    Network {
        /// Description of the failure, including the URL involved.
        message: String,
        /// Optional hint for the user.
        #[help]
        help: Option<String>,
    },

    /// A remote resource (release, asset) does not exist.
    #[error("Not found: {message}")]
    #[diagnostic(code(slnbake::not_found))]
    NotFound {
        /// What was looked up.
        message: String,
    },

    /// A release has fewer assets than the configured asset index requires.
    #[error("Asset index {index} out of range for {repo} (release has {available} assets)")]
    #[diagnostic(
        code(slnbake::asset_index),
        help("The upstream release layout changed; review the configured asset index")
    )]
    AssetIndexOutOfRange {
        /// `owner/repo` of the release.
        repo: String,
        /// Requested index.
        index: usize,
        /// Number of assets in the release.
        available: usize,
    },

    /// An external process could not be run or reported failure.
    #[error("Process error: {message}")]
    #[diagnostic(code(slnbake::subprocess))]
    Subprocess {
        /// Description of the failure.
        message: String,
    },

    /// Tool output could not be parsed.
    #[error("Parse error: {message}")]
    #[diagnostic(code(slnbake::parse))]
    Parse {
        /// Description of what could not be parsed.
        message: String,
    },

    /// A task body failed.
    #[error("Task '{task}' failed: {message}")]
    #[diagnostic(code(slnbake::task))]
    Task {
        /// Name of the failing task.
        task: String,
        /// Description of the failure.
        message: String,
    },

    /// I/O error with path context.
    #[error("I/O {operation} failed{}: {source}", path_suffix(.path.as_deref()))]
    #[diagnostic(code(slnbake::io))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// The path involved, if any.
        path: Option<Box<Path>>,
        /// The operation that failed.
        operation: String,
    },
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            help: None,
        }
    }

    /// Create a network error with help text.
    #[must_use]
    pub fn network_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a subprocess error.
    #[must_use]
    pub fn subprocess(message: impl Into<String>) -> Self {
        Self::Subprocess {
            message: message.into(),
        }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a task failure.
    #[must_use]
    pub fn task(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Task {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    #[must_use]
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }
}

fn path_suffix(path: Option<&Path>) -> String {
    path.map_or_else(String::new, |p| format!(" on {}", p.display()))
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::io(source, None, "operation")
    }
}
