//! HTTP download provider for slnbake.
//!
//! Fetches a single file from a direct URL into the tools cache. No
//! archive handling: the response body is written to disk as-is.

use async_trait::async_trait;
use reqwest::Client;
use slnbake_core::tools::Downloader;
use slnbake_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("slnbake/", env!("CARGO_PKG_VERSION"));

/// Downloads files over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a network error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "Downloading");

        let response = self.client.get(url).send().await.map_err(|e| {
            Error::network_with_help(
                format!("Failed to download {url}: {e}"),
                "Check network access, or pass an explicit tool path",
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "Failed to download {url} (HTTP {status})"
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::network(format!("Failed to read response from {url}: {e}")))
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let data = self.fetch_bytes(url).await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(e, Some(parent.to_path_buf()), "create directory"))?;
        }

        write_then_rename(destination, &data).await?;

        info!(
            %url,
            path = %destination.display(),
            bytes = data.len(),
            "Downloaded file"
        );
        Ok(())
    }
}

/// Sibling file a download is written to before it is moved into place.
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map_or_else(|| "download".into(), |n| n.to_string_lossy());
    destination.with_file_name(format!(".{name}.part"))
}

/// Write `data` next to `destination`, then rename it over `destination`.
/// A failed write never leaves a file at `destination`.
async fn write_then_rename(destination: &Path, data: &[u8]) -> Result<()> {
    let partial = partial_path(destination);

    if let Err(e) = tokio::fs::write(&partial, data).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(Error::io(e, Some(partial), "write download"));
    }

    if let Err(e) = tokio::fs::rename(&partial, destination).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(Error::io(e, Some(destination.to_path_buf()), "move download into place"));
    }
    Ok(())
}
