//! Install run state machine.
//!
//! `CheckDeps → DetectPlatform → ValidateProfile → ResolveVersion →
//! TryRelease → [TrySource] → ConfigureClients → Summary → Done`
//!
//! Each stage either advances or returns an [`InstallError`]. The release
//! strategy reports failure as a value, which is the only way into
//! `TrySource`. A client that cannot be configured does not stop the
//! others, but the run still fails after the summary is printed.

use crate::clients::{configure_clients, known_clients, ClientResult, ClientStatus};
use crate::config::{dir_on_path, HostDirs, InstallSettings, SERVER_KEY};
use crate::error::InstallError;
use crate::install::release::binary_names;
use crate::install::{ReleaseChannel, SourceBuilder};
use crate::merge::{fresh_document, render, MergeOutcome};
use crate::platform;
use crate::progress::{ProgressReporter, Window};
use crate::types::*;
use anyhow::anyhow;
use console::style;

const RESOLVE_WINDOW: Window = Window::new(0, 5);
const CLIENTS_WINDOW: Window = Window::new(90, 99);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckDeps,
    DetectPlatform,
    ValidateProfile,
    ResolveVersion,
    TryRelease,
    TrySource,
    ConfigureClients,
    Summary,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Release(String),
    Source,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub profile: InstallProfile,
    pub platform: PlatformId,
    pub target: InstallTarget,
    pub strategy: Strategy,
    pub report: InstallReport,
    pub clients: Vec<ClientResult>,
    pub stages: Vec<Stage>,
    pub dry_run: bool,
}

pub struct Orchestrator<R, S> {
    settings: InstallSettings,
    release: R,
    source: S,
    reporter: ProgressReporter,
    host: Option<HostDirs>,
    platform: Option<PlatformId>,
    stages: Vec<Stage>,
}

impl<R: ReleaseChannel, S: SourceBuilder> Orchestrator<R, S> {
    pub fn new(settings: InstallSettings, release: R, source: S, reporter: ProgressReporter) -> Self {
        Self {
            settings,
            release,
            source,
            reporter,
            host: None,
            platform: None,
            stages: Vec::new(),
        }
    }

    /// Use these directories instead of asking the OS.
    #[cfg(test)]
    pub fn with_host_dirs(mut self, dirs: HostDirs) -> Self {
        self.host = Some(dirs);
        self
    }

    /// Use this platform instead of the host's.
    #[cfg(test)]
    pub fn with_platform(mut self, platform: PlatformId) -> Self {
        self.platform = Some(platform);
        self
    }

    pub async fn run(&mut self) -> Result<RunSummary, InstallError> {
        let result = self.run_stages().await;
        match &result {
            Ok(_) => {
                self.reporter.finish();
                tracing::debug!("Finished at {}%", self.reporter.state().percent());
            }
            Err(_) => self.reporter.abandon(),
        }
        result
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(?stage, "entering stage");
        self.stages.push(stage);
    }

    async fn run_stages(&mut self) -> Result<RunSummary, InstallError> {
        self.enter(Stage::CheckDeps);
        let dirs = match &self.host {
            Some(dirs) => dirs.clone(),
            None => HostDirs::detect()?,
        };

        self.enter(Stage::DetectPlatform);
        let platform = match self.platform {
            Some(platform) => platform,
            None => platform::get_system_info()?,
        };
        tracing::info!("Platform: {}", platform);

        self.enter(Stage::ValidateProfile);
        let profile: InstallProfile = self.settings.profile.parse()?;
        tracing::info!("Profile: {}", profile);

        let target = InstallTarget {
            install_dir: self
                .settings
                .install_dir
                .clone()
                .unwrap_or_else(|| dirs.default_install_dir()),
            manifest: ArtifactManifest::default(),
        };

        self.enter(Stage::ResolveVersion);
        tracing::info!("Requested version: {}", self.settings.version);
        self.reporter.set_phase(RESOLVE_WINDOW, "Resolving version");
        let resolved = self.release.resolve_version(&self.settings.version).await;
        self.reporter.complete(RESOLVE_WINDOW);

        let release_result = match resolved {
            ResolvedVersion::Resolved(tag) => {
                self.enter(Stage::TryRelease);
                match self
                    .release
                    .install(&tag, &platform, &target, &mut self.reporter)
                    .await
                {
                    InstallOutcome::Success(report) => Some((Strategy::Release(tag), report)),
                    InstallOutcome::Failure(reason) => {
                        self.reporter.eprintln(format!(
                            "{} release {} unavailable ({}), building from source",
                            style("!").yellow(),
                            tag,
                            reason
                        ));
                        None
                    }
                }
            }
            ResolvedVersion::Unavailable => {
                self.reporter.eprintln(format!(
                    "{} no release found, building from source",
                    style("!").yellow()
                ));
                None
            }
        };

        let (strategy, report) = match release_result {
            Some(installed) => installed,
            None => {
                self.enter(Stage::TrySource);
                let report = self
                    .source
                    .install_from_source(&self.settings.version, &target, &dirs, &mut self.reporter)
                    .await?;
                (Strategy::Source, report)
            }
        };

        let clients = if profile.configures_clients() {
            self.enter(Stage::ConfigureClients);
            self.reporter.set_phase(CLIENTS_WINDOW, "Configuring clients");
            let command = target
                .server_command()
                .ok_or_else(|| anyhow!("install manifest has no server binary"))?;
            let results = configure_clients(
                &known_clients(&dirs),
                SERVER_KEY,
                &command,
                self.settings.dry_run,
            );
            self.reporter.complete(CLIENTS_WINDOW);
            results
        } else {
            Vec::new()
        };

        self.enter(Stage::Summary);
        let summary = RunSummary {
            profile,
            platform,
            target,
            strategy,
            report,
            clients,
            stages: self.stages.clone(),
            dry_run: self.settings.dry_run,
        };
        self.print_summary(&summary)?;

        let failed: Vec<String> = summary
            .clients
            .iter()
            .filter(|c| matches!(c.status, ClientStatus::Failed(_)))
            .map(|c| c.name.to_string())
            .collect();
        if !failed.is_empty() {
            return Err(InstallError::ClientConfigFailed { clients: failed });
        }

        self.enter(Stage::Done);
        Ok(RunSummary {
            stages: self.stages.clone(),
            ..summary
        })
    }

    fn print_summary(&self, summary: &RunSummary) -> Result<(), InstallError> {
        let out = &self.reporter;
        let install_dir = &summary.target.install_dir;

        let via = match &summary.strategy {
            Strategy::Release(tag) => format!("release {}", tag),
            Strategy::Source => "source build".to_string(),
        };

        if summary.dry_run {
            out.println(format!(
                "{} dry run complete: {} would be installed into {} from {} ({})",
                style("✓").green(),
                binary_names(&summary.target.manifest),
                install_dir.display(),
                via,
                summary.platform
            ));
        } else {
            out.println(format!(
                "{} installed from {} ({})",
                style("✓").green(),
                via,
                summary.platform
            ));
            for path in &summary.report.installed {
                out.println(format!("    {}", path.display()));
            }
        }

        for notice in &summary.report.notices {
            out.println(format!("  {} {}", style("note:").cyan(), notice));
        }

        for client in &summary.clients {
            let line = match &client.status {
                ClientStatus::Configured(MergeOutcome::DryRun) => format!(
                    "{} {}: would configure {}",
                    style("·").dim(),
                    client.name,
                    client.path.display()
                ),
                ClientStatus::Configured(MergeOutcome::Unchanged) => format!(
                    "{} {}: already configured ({})",
                    style("✓").green(),
                    client.name,
                    client.path.display()
                ),
                ClientStatus::Configured(_) => format!(
                    "{} {}: configured ({})",
                    style("✓").green(),
                    client.name,
                    client.path.display()
                ),
                ClientStatus::NotDetected => {
                    format!("{} {}: not detected", style("·").dim(), client.name)
                }
                ClientStatus::Failed(reason) => {
                    format!("{} {}: {}", style("✗").red(), client.name, reason)
                }
            };
            out.println(line);
        }

        if !summary.profile.configures_clients() {
            if let Some(command) = summary.target.server_command() {
                let snippet = render(&fresh_document(
                    SERVER_KEY,
                    &McpServerEntry::serve(&command.to_string_lossy()),
                ))?;
                out.println(format!(
                    "Profile '{}' does not configure clients. Add this to your MCP client config:",
                    summary.profile
                ));
                out.println(snippet.trim_end());
            }
        } else if summary
            .clients
            .iter()
            .any(|c| matches!(c.status, ClientStatus::Configured(_)))
        {
            out.println("Restart your MCP clients to load the server.");
        }

        if !dir_on_path(install_dir) {
            out.println(format!(
                "  {} {} is not on your PATH; add it to use `{}` directly",
                style("note:").cyan(),
                install_dir.display(),
                crate::config::CLI_BINARY
            ));
        }

        Ok(())
    }
}
