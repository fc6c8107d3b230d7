//! Acquisition traits implemented by the tool crates.
//!
//! The lifecycle only talks to these traits, so the network and process
//! layers can be swapped for fakes in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::Result;

/// Fetches a file over HTTP into the tools cache.
///
/// Implementations do not check whether `destination` already exists;
/// the caller decides when a download is needed.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` and write the full body to `destination`,
    /// creating parent directories when absent.
    ///
    /// # Errors
    ///
    /// Returns a network error if the host is unreachable or the response is
    /// not a success, and an I/O error if the file cannot be written.
    async fn download(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Looks up published releases of a repository.
#[async_trait]
pub trait ReleaseIndex: Send + Sync {
    /// Download URL of the asset at `asset_index` in the latest release of
    /// `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the repository has no release, an
    /// asset-index error if the release has too few assets, and a network
    /// error if the index cannot be queried.
    async fn latest_asset_url(&self, owner: &str, repo: &str, asset_index: usize)
    -> Result<String>;
}

/// Reports where the newest build-tool installation lives.
#[async_trait]
pub trait InstallLocator: Send + Sync {
    /// Run the locator at `locator` and derive the MSBuild path of the
    /// newest installation.
    ///
    /// A locator that cannot run or exits unsuccessfully yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the locator succeeded but its output is not
    /// a list of installations with an `installationPath`.
    async fn detect_latest_install(&self, locator: &Path) -> Result<Option<PathBuf>>;
}
