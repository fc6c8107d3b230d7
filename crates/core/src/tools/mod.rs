//! Tool resolution for the restore tool, the installation locator and MSBuild.
//!
//! # Architecture
//!
//! - [`ToolSpec`] - where a tool lives inside the tools cache
//! - [`ToolPath`] - a resolved executable path, or nothing
//! - [`ToolCache`] - override, then cache, then acquisition
//! - [`ToolRegistry`] - the final, read-only set of resolved paths
//! - [`Downloader`], [`ReleaseIndex`], [`InstallLocator`] - acquisition seams
//!   implemented by the tool crates
//!
//! # Example
//!
//! ```ignore
//! use slnbake_core::tools::{ToolCache, NUGET};
//!
//! let cache = ToolCache::new(config.tools_dir());
//! let nuget = cache
//!     .resolve(&NUGET, config.overrides().restore_tool.as_deref(), |dest| async move {
//!         downloader.download(NUGET_URL, &dest).await?;
//!         Ok(dest)
//!     })
//!     .await?;
//! ```

mod cache;
mod provider;
mod registry;

pub use cache::ToolCache;
pub(crate) use cache::usable_override;
pub use provider::{Downloader, InstallLocator, ReleaseIndex};
pub use registry::{Tool, ToolRegistry};

use std::path::{Path, PathBuf};

/// Fixed download location of the NuGet command-line client.
pub const NUGET_URL: &str = "https://dist.nuget.org/win-x86-commandline/latest/nuget.exe";

/// GitHub owner publishing vswhere.
pub const VSWHERE_OWNER: &str = "microsoft";

/// GitHub repository publishing vswhere.
pub const VSWHERE_REPO: &str = "vswhere";

/// Which asset of the latest vswhere release is the executable.
///
/// vswhere publishes a single asset per release. If upstream ever ships
/// several, this index picks the wrong one; review it before bumping.
pub const VSWHERE_ASSET_INDEX: usize = 0;

/// Location of a tool inside the tools cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Short name used in logs.
    pub name: &'static str,
    /// Subdirectory under the cache root.
    pub dir: &'static str,
    /// Executable file name.
    pub file: &'static str,
}

impl ToolSpec {
    /// Conventional cached location under `cache_root`.
    #[must_use]
    pub fn cache_path(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(self.dir).join(self.file)
    }
}

/// NuGet, cached at `tools/NuGet/nuget.exe`.
pub const NUGET: ToolSpec = ToolSpec {
    name: "nuget",
    dir: "NuGet",
    file: "nuget.exe",
};

/// vswhere, cached at `tools/VsWhere/vswhere.exe`.
pub const VSWHERE: ToolSpec = ToolSpec {
    name: "vswhere",
    dir: "VsWhere",
    file: "vswhere.exe",
};

/// A resolved absolute path to an executable, or unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPath(Option<PathBuf>);

impl ToolPath {
    /// A path that was never resolved.
    #[must_use]
    pub fn unresolved() -> Self {
        Self(None)
    }

    /// A resolved path.
    #[must_use]
    pub fn resolved(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    /// Whether a path was resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.0.is_some()
    }

    /// The resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }

    /// Directory containing the executable.
    #[must_use]
    pub fn containing_dir(&self) -> Option<&Path> {
        self.path().and_then(Path::parent)
    }
}

impl From<Option<PathBuf>> for ToolPath {
    fn from(path: Option<PathBuf>) -> Self {
        Self(path)
    }
}

impl std::fmt::Display for ToolPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "<unresolved>"),
        }
    }
}
