//! Resolution of a tool to a file inside the tools cache.

use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::ToolSpec;
use crate::{Error, Result, paths};

/// Resolves tools against an explicit override and the tools cache.
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
}

impl ToolCache {
    /// Create a cache rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root if absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::io(e, Some(self.root.clone()), "create tools directory"))
    }

    /// Resolve `tool` to an executable path.
    ///
    /// 1. An override that names an existing file is returned unchanged.
    /// 2. Otherwise the conventional cache path is returned if it exists.
    /// 3. Otherwise the tool's cache subdirectory is created and `fetch` is
    ///    called with the cache path; its result is returned.
    ///
    /// Acquisition errors are propagated as-is, there is no retry.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` returns, or an I/O error if the cache
    /// subdirectory cannot be created.
    pub async fn resolve<F, Fut>(
        &self,
        tool: &ToolSpec,
        override_path: Option<&Path>,
        fetch: F,
    ) -> Result<PathBuf>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<PathBuf>>,
    {
        if let Some(path) = usable_override(override_path, tool.name) {
            debug!(tool = tool.name, path = %path.display(), "Using explicit tool path");
            return Ok(path.to_path_buf());
        }

        let cached = tool.cache_path(&self.root);
        if paths::exists(&cached) {
            debug!(tool = tool.name, path = %cached.display(), "Tool already cached");
            return Ok(cached);
        }

        if let Some(parent) = cached.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(e, Some(parent.to_path_buf()), "create tool directory"))?;
        }

        info!(tool = tool.name, path = %cached.display(), "Acquiring tool");
        fetch(cached).await
    }
}

/// The override if it names an existing file. A missing one is logged and
/// dropped so normal resolution continues.
pub(crate) fn usable_override<'p>(path: Option<&'p Path>, tool: &str) -> Option<&'p Path> {
    if paths::exists_opt(path) {
        return path;
    }
    if let Some(p) = path {
        warn!(tool, path = %p.display(), "Tool override does not exist, ignoring it");
    }
    None
}
