//! GitHub release lookup and artifact naming
//!
//! Resolves the requested version to a concrete tag and builds the asset
//! URL for a platform. A failed lookup is never fatal: it resolves to
//! [`ResolvedVersion::Unavailable`] and the caller falls back to a source build.

use crate::config::{APP_NAME, GITHUB_REPO, PROJECT_NAME};
use crate::types::{GitHubRelease, PlatformId, ResolvedVersion, VersionRef};
use anyhow::{anyhow, Result};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where releases are queried and downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    pub api_base: String,
    pub download_base: String,
    pub repo: String,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            download_base: "https://github.com".to_string(),
            repo: GITHUB_REPO.to_string(),
        }
    }
}

impl ReleaseSource {
    pub fn latest_release_url(&self) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, self.repo)
    }

    /// Build the download URL of the asset for `tag` on `platform`
    ///
    /// # Arguments
    /// * `tag` - Release tag, with or without a leading 'v'
    /// * `platform` - Target platform
    pub fn asset_url(&self, tag: &str, platform: &PlatformId) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.download_base,
            self.repo,
            tag,
            asset_name(tag, platform)
        )
    }
}

/// Asset file name: `{project}-{version without 'v'}-{platform}.tar.gz`
pub fn asset_name(tag: &str, platform: &PlatformId) -> String {
    format!(
        "{}-{}-{}.tar.gz",
        PROJECT_NAME,
        tag.trim_start_matches('v'),
        platform
    )
}

pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Resolve the requested version to a tag
///
/// Explicit tags are returned unchanged and unvalidated. `latest` queries
/// the releases API once.
pub async fn resolve_version(
    client: &reqwest::Client,
    source: &ReleaseSource,
    requested: &VersionRef,
) -> ResolvedVersion {
    match requested {
        VersionRef::Tag(tag) => ResolvedVersion::Resolved(tag.clone()),
        VersionRef::Latest => match fetch_latest_tag(client, source).await {
            Ok(tag) => {
                tracing::info!("Latest release is {}", tag);
                ResolvedVersion::Resolved(tag)
            }
            Err(e) => {
                tracing::warn!("Could not resolve latest release: {}", e);
                ResolvedVersion::Unavailable
            }
        },
    }
}

async fn fetch_latest_tag(client: &reqwest::Client, source: &ReleaseSource) -> Result<String> {
    let url = source.latest_release_url();
    tracing::debug!("Fetching GitHub release info from: {}", url);

    let mut request = client
        .get(&url)
        .header("Accept", "application/vnd.github+json");

    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        request = request.bearer_auth(token);
        tracing::debug!("Using GITHUB_TOKEN");
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(anyhow!("GitHub API request failed: {}", response.status()));
    }

    let release: GitHubRelease = response.json().await?;
    release
        .tag_name
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("release response has no tag_name"))
}
