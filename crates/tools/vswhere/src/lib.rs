//! Visual Studio installation locator for slnbake.
//!
//! Runs `vswhere` to find the newest installation that ships MSBuild and
//! derives the `MSBuild.exe` path inside it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slnbake_core::tools::InstallLocator;
use slnbake_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Path of the MSBuild binaries relative to an installation root.
///
/// Compatibility contract with the Visual Studio 2019+ layout. The casing is
/// kept as `Msbuild` even though the directory on disk is `MSBuild`; Windows
/// resolves both to the same directory.
pub const MSBUILD_RELATIVE_PATH: &str = "Msbuild/Current/Bin";

/// MSBuild executable name.
pub const MSBUILD_EXE: &str = "MSBuild.exe";

/// Arguments passed to the locator: newest installation, JSON output,
/// restricted to installations containing MSBuild.
pub const LOCATOR_ARGS: [&str; 5] = [
    "-latest",
    "-format",
    "json",
    "-requires",
    "Microsoft.Component.MSBuild",
];

/// One installation as reported by `vswhere -format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationRecord {
    /// Root directory of the installation.
    pub installation_path: PathBuf,
    /// Product version, e.g. `17.9.34607.119`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_version: Option<String>,
    /// Human readable product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl InstallationRecord {
    /// Path of `MSBuild.exe` inside this installation.
    #[must_use]
    pub fn msbuild_path(&self) -> PathBuf {
        self.installation_path
            .join(MSBUILD_RELATIVE_PATH)
            .join(MSBUILD_EXE)
    }
}

/// Parse locator output into installation records.
///
/// # Errors
///
/// Returns a parse error if `stdout` is not a JSON array of objects each
/// carrying an `installationPath`.
pub fn parse_installations(stdout: &str) -> Result<Vec<InstallationRecord>> {
    serde_json::from_str(stdout.trim())
        .map_err(|e| Error::parse(format!("Unexpected vswhere output: {e}")))
}

/// MSBuild path of the first reported installation, if any.
///
/// # Errors
///
/// Propagates [`parse_installations`] errors.
pub fn msbuild_from_output(stdout: &str) -> Result<Option<PathBuf>> {
    let installations = parse_installations(stdout)?;
    Ok(installations.first().map(InstallationRecord::msbuild_path))
}

/// Locates installations by running `vswhere`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VsWhereLocator;

impl VsWhereLocator {
    /// Create a new locator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InstallLocator for VsWhereLocator {
    async fn detect_latest_install(&self, locator: &Path) -> Result<Option<PathBuf>> {
        debug!(locator = %locator.display(), args = ?LOCATOR_ARGS, "Running installation locator");

        let output = match Command::new(locator).args(LOCATOR_ARGS).output().await {
            Ok(output) => output,
            Err(e) => {
                warn!(locator = %locator.display(), error = %e, "Failed to run installation locator");
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                status = %output.status,
                stderr = %stderr.trim(),
                "Installation locator exited unsuccessfully"
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let msbuild = msbuild_from_output(&stdout)?;
        match &msbuild {
            Some(path) => info!(msbuild = %path.display(), "Detected MSBuild installation"),
            None => warn!("Installation locator reported no installations"),
        }
        Ok(msbuild)
    }
}
