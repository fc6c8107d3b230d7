//! GitHub Releases lookup for slnbake.
//!
//! Resolves the download URL of an asset in the latest published release
//! of a repository. The asset is picked by position, not by name.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use slnbake_core::tools::ReleaseIndex;
use slnbake_core::{Error, Result};
use tracing::debug;

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub release metadata from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Tag the release was cut from.
    #[serde(default)]
    pub tag_name: String,
    /// Uploaded assets, in the order the API lists them.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// GitHub release asset.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    /// File name of the asset.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
}

/// Parse a release document as returned by `GET /repos/{owner}/{repo}/releases/latest`.
///
/// # Errors
///
/// Returns a parse error if `body` is not a release object.
pub fn parse_release(body: &str) -> Result<Release> {
    serde_json::from_str(body).map_err(|e| Error::parse(format!("Invalid release JSON: {e}")))
}

/// Download URL of the asset at `index` in `release`.
///
/// # Errors
///
/// Returns [`Error::AssetIndexOutOfRange`] if the release has too few assets.
pub fn asset_url(release: &Release, repo: &str, index: usize) -> Result<String> {
    release
        .assets
        .get(index)
        .map(|asset| asset.browser_download_url.clone())
        .ok_or_else(|| Error::AssetIndexOutOfRange {
            repo: repo.to_string(),
            index,
            available: release.assets.len(),
        })
}

/// Release index backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubReleaseIndex {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubReleaseIndex {
    /// Create an index against the public API.
    ///
    /// Uses `GITHUB_TOKEN`, then `GH_TOKEN`, for authentication when set.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("slnbake/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            token: token_from_env(),
        })
    }

    /// Point the index at a different API endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the authentication token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Fetch the latest release of `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error on HTTP 404, a network error on any other
    /// failure, and a parse error if the body is not a release.
    pub async fn latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.api_url);
        debug!(%url, "Fetching latest GitHub release");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to fetch release of {owner}/{repo}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!(
                "No published release for {owner}/{repo}"
            )));
        }
        if !status.is_success() {
            return Err(Error::network_with_help(
                format!("Release lookup for {owner}/{repo} failed (HTTP {status})"),
                "Set GITHUB_TOKEN if the API rate limit was exceeded",
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read release response: {e}")))?;
        parse_release(&body)
    }
}

#[async_trait]
impl ReleaseIndex for GitHubReleaseIndex {
    async fn latest_asset_url(&self, owner: &str, repo: &str, asset_index: usize) -> Result<String> {
        let release = self.latest_release(owner, repo).await?;
        let url = asset_url(&release, &format!("{owner}/{repo}"), asset_index)?;
        debug!(tag = %release.tag_name, %url, "Resolved release asset");
        Ok(url)
    }
}

fn token_from_env() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LATEST: &str = "/repos/microsoft/vswhere/releases/latest";

    const RELEASE: &str = r#"{
        "tag_name": "3.1.7",
        "assets": [
            {"name": "vswhere.exe", "browser_download_url": "https://example.test/vswhere.exe"},
            {"name": "vswhere.exe.sig", "browser_download_url": "https://example.test/vswhere.exe.sig"}
        ]
    }"#;

    async fn serve(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LATEST))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn index(server: &MockServer) -> GitHubReleaseIndex {
        GitHubReleaseIndex::new()
            .unwrap()
            .with_api_url(server.uri())
            .with_token(None)
    }

    #[test]
    fn test_asset_url_by_position() {
        let release = parse_release(RELEASE).unwrap();
        assert_eq!(release.tag_name, "3.1.7");
        assert_eq!(
            asset_url(&release, "microsoft/vswhere", 0).unwrap(),
            "https://example.test/vswhere.exe"
        );
        assert_eq!(
            asset_url(&release, "microsoft/vswhere", 1).unwrap(),
            "https://example.test/vswhere.exe.sig"
        );
    }

    #[test]
    fn test_asset_index_out_of_range() {
        let release = parse_release(r#"{"tag_name": "1.0", "assets": []}"#).unwrap();
        let err = asset_url(&release, "microsoft/vswhere", 0).unwrap_err();
        assert!(matches!(
            err,
            Error::AssetIndexOutOfRange { index: 0, available: 0, .. }
        ));
    }

    #[test]
    fn test_parse_release_rejects_garbage() {
        assert!(matches!(
            parse_release("not json"),
            Err(Error::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_latest_asset_url_from_api() {
        let server = serve(200, RELEASE).await;
        let url = index(&server)
            .latest_asset_url("microsoft", "vswhere", 0)
            .await
            .unwrap();
        assert_eq!(url, "https://example.test/vswhere.exe");
    }

    #[tokio::test]
    async fn test_token_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LATEST))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RELEASE))
            .expect(1)
            .mount(&server)
            .await;

        let url = index(&server)
            .with_token(Some("s3cret".into()))
            .latest_asset_url("microsoft", "vswhere", 0)
            .await
            .unwrap();
        assert_eq!(url, "https://example.test/vswhere.exe");
    }

    #[tokio::test]
    async fn test_missing_release_is_not_found() {
        let server = serve(404, r#"{"message": "Not Found"}"#).await;
        let err = index(&server)
            .latest_asset_url("microsoft", "vswhere", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let server = serve(500, "").await;
        let err = index(&server)
            .latest_asset_url("microsoft", "vswhere", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
    }
}
