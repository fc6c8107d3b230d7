//! Setup and teardown around task execution.
//!
//! Setup walks a fixed sequence of states, each entered once:
//!
//! ```text
//! Init -> DirectoriesEnsured -> ToolsAcquired -> (PlatformDetectionDone | Skipped)
//!      -> ToolsRegistered -> Ready
//! ```
//!
//! Any error aborts setup before the registry exists, so no task can observe
//! a partially resolved tool set.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::BuildConfiguration;
use crate::host::HostCapabilities;
use crate::tools::{
    Downloader, InstallLocator, NUGET, NUGET_URL, ReleaseIndex, ToolCache, ToolPath,
    ToolRegistry, VSWHERE, VSWHERE_ASSET_INDEX, VSWHERE_OWNER, VSWHERE_REPO, usable_override,
};
use crate::Result;

/// Setup progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing done yet.
    Init,
    /// Tools-cache root exists.
    DirectoriesEnsured,
    /// NuGet (and on detection-capable hosts, vswhere) resolved.
    ToolsAcquired,
    /// MSBuild path detected through the locator.
    PlatformDetectionDone,
    /// Detection not attempted, or it produced nothing.
    Skipped,
    /// Registry built.
    ToolsRegistered,
    /// Task dispatch may begin.
    Ready,
}

/// Acquisition backends used during setup.
#[derive(Clone)]
pub struct Providers {
    /// HTTP downloads.
    pub downloader: Arc<dyn Downloader>,
    /// Release index for the locator.
    pub releases: Arc<dyn ReleaseIndex>,
    /// Installation locator runner.
    pub locator: Arc<dyn InstallLocator>,
}

/// Drives setup and teardown for one run.
pub struct Lifecycle<'a> {
    config: &'a BuildConfiguration,
    host: HostCapabilities,
    providers: Providers,
    cache: ToolCache,
    locator_asset_index: usize,
    history: Vec<LifecycleState>,
}

impl<'a> Lifecycle<'a> {
    /// Create a lifecycle for `config` on a host with `host` capabilities.
    #[must_use]
    pub fn new(config: &'a BuildConfiguration, host: HostCapabilities, providers: Providers) -> Self {
        Self {
            config,
            host,
            providers,
            cache: ToolCache::new(config.tools_dir()),
            locator_asset_index: VSWHERE_ASSET_INDEX,
            history: vec![LifecycleState::Init],
        }
    }

    /// Use a different asset of the locator's latest release.
    #[must_use]
    pub fn with_locator_asset_index(mut self, index: usize) -> Self {
        self.locator_asset_index = index;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.history
            .last()
            .copied()
            .unwrap_or(LifecycleState::Init)
    }

    /// Every state entered so far, in order.
    #[must_use]
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    fn advance(&mut self, next: LifecycleState) {
        debug!(from = ?self.state(), to = ?next, "Lifecycle transition");
        self.history.push(next);
    }

    /// Run setup to completion and return the tool registry.
    ///
    /// # Errors
    ///
    /// Returns the first acquisition error (I/O, network, release lookup)
    /// or a parse error from the locator. Non-zero locator exits are not
    /// errors.
    #[instrument(name = "setup", skip_all)]
    pub async fn setup(&mut self) -> Result<ToolRegistry> {
        self.cache.ensure_root().await?;
        self.advance(LifecycleState::DirectoriesEnsured);

        let restore_tool = self.acquire_restore_tool().await?;
        let locator_tool = if self.host.platform_supports_locator_detection() {
            ToolPath::resolved(self.acquire_locator_tool().await?)
        } else {
            let locator = self.config.overrides().locator_tool.as_deref();
            ToolPath::from(usable_override(locator, VSWHERE.name).map(Path::to_path_buf))
        };
        self.advance(LifecycleState::ToolsAcquired);

        let build_tool = self.resolve_build_tool(&locator_tool).await?;

        let registry = ToolRegistry::new(build_tool, ToolPath::resolved(restore_tool), locator_tool);
        for (tool, path) in registry.iter() {
            info!(%tool, path = %path.display(), "Registered tool");
        }
        self.advance(LifecycleState::ToolsRegistered);

        self.advance(LifecycleState::Ready);
        Ok(registry)
    }

    /// Reserved for cleanup after the task graph ran; currently does nothing.
    pub fn teardown(&mut self) {
        debug!("Teardown");
    }

    async fn acquire_restore_tool(&self) -> Result<PathBuf> {
        let downloader = Arc::clone(&self.providers.downloader);
        self.cache
            .resolve(
                &NUGET,
                self.config.overrides().restore_tool.as_deref(),
                |dest| async move {
                    downloader.download(NUGET_URL, &dest).await?;
                    Ok(dest)
                },
            )
            .await
    }

    async fn acquire_locator_tool(&self) -> Result<PathBuf> {
        let downloader = Arc::clone(&self.providers.downloader);
        let releases = Arc::clone(&self.providers.releases);
        let asset_index = self.locator_asset_index;
        self.cache
            .resolve(
                &VSWHERE,
                self.config.overrides().locator_tool.as_deref(),
                |dest| async move {
                    let url = releases
                        .latest_asset_url(VSWHERE_OWNER, VSWHERE_REPO, asset_index)
                        .await?;
                    downloader.download(&url, &dest).await?;
                    Ok(dest)
                },
            )
            .await
    }

    async fn resolve_build_tool(&mut self, locator_tool: &ToolPath) -> Result<ToolPath> {
        let config = self.config;
        if let Some(explicit) = usable_override(config.overrides().build_tool.as_deref(), "msbuild") {
            debug!("Explicit MSBuild path supplied, skipping detection");
            self.advance(LifecycleState::Skipped);
            return Ok(ToolPath::resolved(explicit));
        }

        let locator = match locator_tool.path() {
            Some(path) if self.host.platform_supports_locator_detection() => path,
            _ => {
                debug!(os = %self.host.os, "MSBuild detection not available on this host");
                self.advance(LifecycleState::Skipped);
                return Ok(ToolPath::unresolved());
            }
        };

        match self.providers.locator.detect_latest_install(locator).await? {
            Some(msbuild) => {
                info!(path = %msbuild.display(), "Detected MSBuild");
                self.advance(LifecycleState::PlatformDetectionDone);
                Ok(ToolPath::resolved(msbuild))
            }
            None => {
                warn!("No MSBuild installation detected; MSBuild path stays unresolved");
                self.advance(LifecycleState::Skipped);
                Ok(ToolPath::unresolved())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildOptions, ToolOverrides};
    use crate::host::Os;
    use crate::test_logs::LogBuffer;
    use crate::{Error, tools::Tool};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeDownloader {
        urls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(&self, url: &str, destination: &Path) -> Result<()> {
            self.urls.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(Error::network(format!("unreachable: {url}")));
            }
            std::fs::write(destination, b"MZ")?;
            Ok(())
        }
    }

    struct FakeReleases {
        calls: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl ReleaseIndex for FakeReleases {
        async fn latest_asset_url(&self, owner: &str, repo: &str, asset_index: usize) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((owner.to_string(), repo.to_string(), asset_index));
            Ok(format!("https://example.test/{owner}/{repo}/{asset_index}"))
        }
    }

    struct FakeLocator {
        result: Option<PathBuf>,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl InstallLocator for FakeLocator {
        async fn detect_latest_install(&self, _locator: &Path) -> Result<Option<PathBuf>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.result.clone())
        }
    }

    struct Fixture {
        _tmp: TempDir,
        config: BuildConfiguration,
        downloader: Arc<FakeDownloader>,
        releases: Arc<FakeReleases>,
        locator: Arc<FakeLocator>,
    }

    impl Fixture {
        fn new(overrides: ToolOverrides, detected: Option<&str>) -> Self {
            Self::with_downloader(overrides, detected, FakeDownloader::default())
        }

        fn with_downloader(
            overrides: ToolOverrides,
            detected: Option<&str>,
            downloader: FakeDownloader,
        ) -> Self {
            let tmp = TempDir::new().unwrap();
            std::fs::write(tmp.path().join("Foo.sln"), b"").unwrap();
            std::fs::write(tmp.path().join("Foo.Test.csproj"), b"").unwrap();
            let options = BuildOptions {
                overrides,
                ..BuildOptions::default()
            };
            let config = BuildConfiguration::discover(tmp.path(), options).unwrap();
            Self {
                _tmp: tmp,
                config,
                downloader: Arc::new(downloader),
                releases: Arc::new(FakeReleases {
                    calls: Mutex::new(Vec::new()),
                }),
                locator: Arc::new(FakeLocator {
                    result: detected.map(PathBuf::from),
                    calls: Mutex::new(0),
                }),
            }
        }

        fn lifecycle(&self, os: Os) -> Lifecycle<'_> {
            let providers = Providers {
                downloader: self.downloader.clone(),
                releases: self.releases.clone(),
                locator: self.locator.clone(),
            };
            Lifecycle::new(&self.config, HostCapabilities::for_os(os), providers)
        }
    }

    #[tokio::test]
    async fn test_windows_setup_detects_msbuild() {
        let fx = Fixture::new(ToolOverrides::default(), Some("/vs/MSBuild/Current/Bin/MSBuild.exe"));
        let mut lifecycle = fx.lifecycle(Os::Windows);

        let registry = lifecycle.setup().await.unwrap();

        assert_eq!(
            lifecycle.history(),
            &[
                LifecycleState::Init,
                LifecycleState::DirectoriesEnsured,
                LifecycleState::ToolsAcquired,
                LifecycleState::PlatformDetectionDone,
                LifecycleState::ToolsRegistered,
                LifecycleState::Ready,
            ]
        );
        assert_eq!(
            registry.get(Tool::BuildTool),
            Some(Path::new("/vs/MSBuild/Current/Bin/MSBuild.exe"))
        );
        assert_eq!(
            registry.get(Tool::RestoreTool),
            Some(fx.config.tools_dir().join("NuGet/nuget.exe").as_path())
        );
        assert_eq!(
            registry.get(Tool::Locator),
            Some(fx.config.tools_dir().join("VsWhere/vswhere.exe").as_path())
        );

        let urls = fx.downloader.urls.lock().unwrap().clone();
        assert_eq!(
            urls,
            vec![
                NUGET_URL.to_string(),
                "https://example.test/microsoft/vswhere/0".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_linux_setup_skips_locator_entirely() {
        let fx = Fixture::new(ToolOverrides::default(), Some("/never"));
        let mut lifecycle = fx.lifecycle(Os::Linux);

        let registry = lifecycle.setup().await.unwrap();

        assert!(lifecycle.history().contains(&LifecycleState::Skipped));
        assert!(!lifecycle.history().contains(&LifecycleState::PlatformDetectionDone));
        assert_eq!(lifecycle.state(), LifecycleState::Ready);
        assert!(!registry.build_tool().is_resolved());
        assert!(!registry.locator().is_resolved());
        assert!(registry.restore_tool().is_resolved());
        assert_eq!(*fx.locator.calls.lock().unwrap(), 0);
        assert!(fx.releases.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_msbuild_skips_detection() {
        let tmp = TempDir::new().unwrap();
        let msbuild = tmp.path().join("MSBuild.exe");
        std::fs::write(&msbuild, b"MZ").unwrap();
        let fx = Fixture::new(
            ToolOverrides {
                build_tool: Some(msbuild.clone()),
                ..ToolOverrides::default()
            },
            Some("/detected/MSBuild.exe"),
        );
        let mut lifecycle = fx.lifecycle(Os::Windows);

        let registry = lifecycle.setup().await.unwrap();

        assert_eq!(registry.get(Tool::BuildTool), Some(msbuild.as_path()));
        assert_eq!(*fx.locator.calls.lock().unwrap(), 0);
        assert!(lifecycle.history().contains(&LifecycleState::Skipped));
    }

    #[tokio::test]
    async fn test_missing_msbuild_override_warns_and_detects() {
        let fx = Fixture::new(
            ToolOverrides {
                build_tool: Some(PathBuf::from("/nowhere/MSBuild.exe")),
                ..ToolOverrides::default()
            },
            Some("/vs/MSBuild/Current/Bin/MSBuild.exe"),
        );
        let logs = LogBuffer::default();
        let _guard = logs.capture();
        let mut lifecycle = fx.lifecycle(Os::Windows);

        let registry = lifecycle.setup().await.unwrap();

        assert_eq!(*fx.locator.calls.lock().unwrap(), 1);
        assert!(lifecycle.history().contains(&LifecycleState::PlatformDetectionDone));
        assert_eq!(
            registry.get(Tool::BuildTool),
            Some(Path::new("/vs/MSBuild/Current/Bin/MSBuild.exe"))
        );
        let output = logs.contents();
        assert!(output.contains("/nowhere/MSBuild.exe"), "{output}");
        assert!(output.contains("Tool override does not exist"), "{output}");
    }

    #[tokio::test]
    async fn test_failed_detection_is_not_fatal() {
        let fx = Fixture::new(ToolOverrides::default(), None);
        let mut lifecycle = fx.lifecycle(Os::Windows);

        let registry = lifecycle.setup().await.unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Ready);
        assert!(lifecycle.history().contains(&LifecycleState::Skipped));
        assert!(!registry.build_tool().is_resolved());
        assert_eq!(*fx.locator.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_existing_restore_override_is_not_downloaded() {
        let tmp = TempDir::new().unwrap();
        let nuget = tmp.path().join("nuget.exe");
        std::fs::write(&nuget, b"MZ").unwrap();
        let fx = Fixture::new(
            ToolOverrides {
                restore_tool: Some(nuget.clone()),
                ..ToolOverrides::default()
            },
            None,
        );
        let mut lifecycle = fx.lifecycle(Os::Linux);

        let registry = lifecycle.setup().await.unwrap();

        assert_eq!(registry.get(Tool::RestoreTool), Some(nuget.as_path()));
        assert!(fx.downloader.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_aborts_setup() {
        let fx = Fixture::with_downloader(
            ToolOverrides::default(),
            None,
            FakeDownloader {
                fail: true,
                ..FakeDownloader::default()
            },
        );
        let mut lifecycle = fx.lifecycle(Os::Windows);

        let err = lifecycle.setup().await.unwrap_err();

        assert!(matches!(err, Error::Network { .. }));
        assert_eq!(lifecycle.state(), LifecycleState::DirectoriesEnsured);
    }

    #[tokio::test]
    async fn test_custom_locator_asset_index() {
        let fx = Fixture::new(ToolOverrides::default(), None);
        let mut lifecycle = fx.lifecycle(Os::Windows).with_locator_asset_index(2);

        lifecycle.setup().await.unwrap();

        let calls = fx.releases.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("microsoft".into(), "vswhere".into(), 2)]);
    }

    #[tokio::test]
    async fn test_second_run_uses_cache() {
        let fx = Fixture::new(ToolOverrides::default(), None);
        fx.lifecycle(Os::Windows).setup().await.unwrap();
        fx.lifecycle(Os::Windows).setup().await.unwrap();

        assert_eq!(fx.downloader.urls.lock().unwrap().len(), 2);
        assert_eq!(fx.releases.calls.lock().unwrap().len(), 1);
    }
}
