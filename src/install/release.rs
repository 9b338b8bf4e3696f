use crate::download::{download_file, extract_tar_gz, find_binary, install_binary};
use crate::install::github::{asset_name, ReleaseSource};
use crate::progress::{ProgressReporter, Window};
use crate::types::*;
use anyhow::{anyhow, Context, Result};
use std::fs;
use tempfile::TempDir;

pub const DOWNLOAD_WINDOW: Window = Window::new(5, 60);
pub const UNPACK_WINDOW: Window = Window::new(60, 90);

/// Download the release asset for `tag` and place its binaries in the target.
///
/// Never returns an error: anything that goes wrong becomes
/// [`InstallOutcome::Failure`] so the caller can fall back to a source build.
pub async fn install_release(
    client: &reqwest::Client,
    source: &ReleaseSource,
    tag: &str,
    platform: &PlatformId,
    target: &InstallTarget,
    dry_run: bool,
    reporter: &mut ProgressReporter,
) -> InstallOutcome {
    let url = source.asset_url(tag, platform);

    if dry_run {
        reporter.println(format!("[dry-run] would download {}", url));
        reporter.println(format!(
            "[dry-run] would install {} into {}",
            binary_names(&target.manifest),
            target.install_dir.display()
        ));
        return InstallOutcome::Success(InstallReport::default());
    }

    match download_and_unpack(client, &url, tag, platform, target, reporter).await {
        Ok(report) => InstallOutcome::Success(report),
        Err(e) => {
            tracing::warn!("Release install failed: {:#}", e);
            InstallOutcome::Failure(format!("{:#}", e))
        }
    }
}

async fn download_and_unpack(
    client: &reqwest::Client,
    url: &str,
    tag: &str,
    platform: &PlatformId,
    target: &InstallTarget,
    reporter: &mut ProgressReporter,
) -> Result<InstallReport> {
    fs::create_dir_all(&target.install_dir).with_context(|| {
        format!("Could not create {}", target.install_dir.display())
    })?;

    // Dropped on every return path, taking the download and extracted tree with it.
    let scratch = TempDir::new().context("Could not create scratch directory")?;
    let archive_path = scratch.path().join(asset_name(tag, platform));

    reporter.set_phase(DOWNLOAD_WINDOW, &format!("Downloading {}", tag));
    download_file(client, url, &archive_path, |done, total| {
        if let Some(total) = total.filter(|t| *t > 0) {
            reporter.advance_within(DOWNLOAD_WINDOW, done as f64 / total as f64);
        }
    })
    .await?;
    reporter.complete(DOWNLOAD_WINDOW);

    reporter.set_phase(UNPACK_WINDOW, "Unpacking");
    let extract_dir = scratch.path().join("extract");
    fs::create_dir_all(&extract_dir)?;
    extract_tar_gz(&archive_path, &extract_dir)?;

    let mut report = InstallReport::default();
    for binary in &target.manifest.binaries {
        match find_binary(&extract_dir, &binary.name) {
            Some(found) => {
                let dest = install_binary(&found, &target.install_dir, &binary.name)?;
                report.installed.push(dest);
            }
            None if binary.required => {
                return Err(anyhow!("{} is missing from the release archive", binary.name));
            }
            None => {
                tracing::warn!("{} not found in release archive, skipping", binary.name);
                report
                    .notices
                    .push(format!("{} was not included in the release archive", binary.name));
            }
        }
    }
    reporter.complete(UNPACK_WINDOW);

    Ok(report)
}

pub fn binary_names(manifest: &ArtifactManifest) -> String {
    manifest
        .binaries
        .iter()
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GITHUB_REPO;
    use crate::install::github::http_client;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use mockito::Server;
    use std::path::Path;

    fn linux_x86() -> PlatformId {
        PlatformId {
            os: Os::Linux,
            arch: Arch::X86_64,
        }
    }

    fn archive_bytes(entries: &[&str]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for name in entries {
            let data = format!("#!/bin/sh\necho {}\n", name);
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn target(dir: &Path) -> InstallTarget {
        InstallTarget {
            install_dir: dir.to_path_buf(),
            manifest: ArtifactManifest::default(),
        }
    }

    fn source(url: &str) -> ReleaseSource {
        ReleaseSource {
            api_base: url.to_string(),
            download_base: url.to_string(),
            repo: GITHUB_REPO.to_string(),
        }
    }

    const ASSET_PATH: &str =
        "/agentralabs/agentic-memory/releases/download/v1.2.0/agentic-memory-1.2.0-linux-x86_64.tar.gz";

    #[tokio::test]
    async fn test_install_release_without_cli() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ASSET_PATH)
            .with_status(200)
            .with_body(archive_bytes(&["agentic-memory-1.2.0/agentic-memory-mcp"]))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let install_dir = temp.path().join("bin");
        let mut reporter = ProgressReporter::hidden();

        let outcome = install_release(
            &http_client().unwrap(),
            &source(&server.url()),
            "v1.2.0",
            &linux_x86(),
            &target(&install_dir),
            false,
            &mut reporter,
        )
        .await;

        match outcome {
            InstallOutcome::Success(report) => {
                assert_eq!(report.installed, vec![install_dir.join("agentic-memory-mcp")]);
                assert_eq!(report.notices.len(), 1);
                assert!(report.notices[0].contains("amem"));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(install_dir.join("agentic-memory-mcp").is_file());
        assert!(!install_dir.join("amem").exists());
        assert_eq!(reporter.state().percent(), UNPACK_WINDOW.end);
    }

    #[tokio::test]
    async fn test_missing_asset_is_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ASSET_PATH)
            .with_status(404)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let outcome = install_release(
            &http_client().unwrap(),
            &source(&server.url()),
            "v1.2.0",
            &linux_x86(),
            &target(temp.path()),
            false,
            &mut ProgressReporter::hidden(),
        )
        .await;

        assert!(matches!(outcome, InstallOutcome::Failure(_)));
    }

    #[tokio::test]
    async fn test_archive_without_server_is_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ASSET_PATH)
            .with_status(200)
            .with_body(archive_bytes(&["amem"]))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let outcome = install_release(
            &http_client().unwrap(),
            &source(&server.url()),
            "v1.2.0",
            &linux_x86(),
            &target(temp.path()),
            false,
            &mut ProgressReporter::hidden(),
        )
        .await;

        match outcome {
            InstallOutcome::Failure(reason) => assert!(reason.contains("agentic-memory-mcp")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        // Nothing listens here; a real request would fail.
        let temp = tempfile::tempdir().unwrap();
        let install_dir = temp.path().join("bin");

        let outcome = install_release(
            &http_client().unwrap(),
            &source("http://127.0.0.1:9"),
            "v1.2.0",
            &linux_x86(),
            &target(&install_dir),
            true,
            &mut ProgressReporter::hidden(),
        )
        .await;

        assert_eq!(outcome, InstallOutcome::Success(InstallReport::default()));
        assert!(!install_dir.exists());
    }
}
