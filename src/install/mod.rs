//! Install strategies
//!
//! - `github`: version resolution and asset naming against GitHub releases
//! - `release`: download and unpack a pre-built release artifact
//! - `source`: build with `cargo install` when no usable release exists
//!
//! The orchestrator talks to both strategies through the traits below so the
//! release-then-source fallback can be exercised without a network.

pub mod github;
pub mod release;
pub mod source;

use crate::config::HostDirs;
use crate::error::InstallError;
use crate::progress::ProgressReporter;
use crate::types::*;

pub use github::{http_client, ReleaseSource};
pub use source::CargoSource;

pub trait ReleaseChannel {
    async fn resolve_version(&self, requested: &VersionRef) -> ResolvedVersion;

    async fn install(
        &self,
        tag: &str,
        platform: &PlatformId,
        target: &InstallTarget,
        reporter: &mut ProgressReporter,
    ) -> InstallOutcome;
}

pub trait SourceBuilder {
    async fn install_from_source(
        &self,
        requested: &VersionRef,
        target: &InstallTarget,
        dirs: &HostDirs,
        reporter: &mut ProgressReporter,
    ) -> Result<InstallReport, InstallError>;
}

pub struct GitHubReleases {
    pub client: reqwest::Client,
    pub source: ReleaseSource,
    pub dry_run: bool,
}

impl ReleaseChannel for GitHubReleases {
    async fn resolve_version(&self, requested: &VersionRef) -> ResolvedVersion {
        github::resolve_version(&self.client, &self.source, requested).await
    }

    async fn install(
        &self,
        tag: &str,
        platform: &PlatformId,
        target: &InstallTarget,
        reporter: &mut ProgressReporter,
    ) -> InstallOutcome {
        release::install_release(
            &self.client,
            &self.source,
            tag,
            platform,
            target,
            self.dry_run,
            reporter,
        )
        .await
    }
}

impl SourceBuilder for CargoSource {
    async fn install_from_source(
        &self,
        requested: &VersionRef,
        target: &InstallTarget,
        dirs: &HostDirs,
        reporter: &mut ProgressReporter,
    ) -> Result<InstallReport, InstallError> {
        self.build_and_install(requested, target, &dirs.cargo_bin_dir(), reporter)
            .await
    }
}
