mod cli;
mod clients;
mod config;
mod download;
mod error;
mod install;
mod merge;
mod orchestrator;
mod platform;
mod progress;
mod types;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use cli::{split_known_args, Cli};
use config::{InstallSettings, GITHUB_REPO};
use console::style;
use error::InstallError;
use install::{http_client, CargoSource, GitHubReleases, ReleaseSource};
use orchestrator::Orchestrator;
use progress::ProgressReporter;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let (known, unknown) = split_known_args(std::env::args());
    let cli = match Cli::try_parse_from(known) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => e.exit(),
        Err(e) => {
            // Usage errors are fatal config errors: exit 1, not clap's 2.
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    let settings = InstallSettings::resolve(&cli);

    if let Err(e) = setup_logging(&settings) {
        eprintln!("warning: could not set up logging: {}", e);
    }

    for arg in &unknown {
        eprintln!("{} ignoring unrecognized argument '{}'", style("warning:").yellow(), arg);
    }

    tokio::select! {
        result = run(settings) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_fatal(&e);
                ExitCode::from(1)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{} interrupted", style("✗").red());
            ExitCode::from(130)
        }
    }
}

async fn run(settings: InstallSettings) -> Result<(), InstallError> {
    let release = GitHubReleases {
        client: http_client()?,
        source: ReleaseSource::default(),
        dry_run: settings.dry_run,
    };
    let source = CargoSource {
        git_url: format!("https://github.com/{}", GITHUB_REPO),
        dry_run: settings.dry_run,
    };
    let reporter = ProgressReporter::new(settings.bar_mode);

    tracing::debug!("Settings: {:?}", settings);
    let mut orchestrator = Orchestrator::new(settings, release, source, reporter);
    let summary = orchestrator.run().await?;
    tracing::debug!("Stages: {:?}", summary.stages);
    Ok(())
}

fn report_fatal(error: &InstallError) {
    eprintln!("{} {}", style("error:").red().bold(), error);
    if let Some(hint) = error.hint() {
        eprintln!("{} {}", style("hint:").cyan(), hint);
    }
}

fn setup_logging(settings: &InstallSettings) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    // The bar owns the terminal in bar mode; only errors get through.
    let level = if settings.bar_mode { "error" } else { "info" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
