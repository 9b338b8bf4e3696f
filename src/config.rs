use crate::cli::Cli;
use crate::error::InstallError;
use crate::types::*;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "amem-install";
pub const PROJECT_NAME: &str = "agentic-memory";
pub const GITHUB_REPO: &str = "agentralabs/agentic-memory";
pub const SERVER_KEY: &str = "agentic-memory";

pub const CLI_BINARY: &str = "amem";
pub const CLI_PACKAGE: &str = "agentic-memory";
pub const SERVER_BINARY: &str = "agentic-memory-mcp";
pub const SERVER_PACKAGE: &str = "agentic-memory-mcp";

pub const PROFILE_ENV: &str = "AGENTRA_INSTALL_PROFILE";
pub const VERBOSE_ENV: &str = "AGENTRA_INSTALL_VERBOSE";

/// Home and per-user config roots that every on-disk path derives from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDirs {
    pub home: PathBuf,
    pub config: PathBuf,
}

impl HostDirs {
    pub fn detect() -> Result<Self, InstallError> {
        let home = dirs::home_dir().ok_or_else(|| {
            InstallError::MissingDependency("could not determine home directory".to_string())
        })?;
        let config = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
        tracing::debug!("Home directory: {}", home.display());
        tracing::debug!("Config directory: {}", config.display());
        Ok(Self { home, config })
    }

    pub fn default_install_dir(&self) -> PathBuf {
        self.home.join(".local").join("bin")
    }

    /// Where `cargo install` drops binaries.
    pub fn cargo_bin_dir(&self) -> PathBuf {
        std::env::var_os("CARGO_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.home.join(".cargo"))
            .join("bin")
    }
}

/// Run settings after flags and environment overrides are applied.
/// The profile stays a raw string here; it is validated in its own stage.
#[derive(Debug, Clone)]
pub struct InstallSettings {
    pub version: VersionRef,
    pub install_dir: Option<PathBuf>,
    pub profile: String,
    pub dry_run: bool,
    pub bar_mode: bool,
}

impl InstallSettings {
    pub fn resolve(cli: &Cli) -> Self {
        let profile = cli
            .profile
            .clone()
            .or_else(|| std::env::var(PROFILE_ENV).ok().filter(|p| !p.is_empty()))
            .unwrap_or_else(|| InstallProfile::default().to_string());

        let verbose_env = std::env::var(VERBOSE_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            version: VersionRef::parse(cli.version.as_deref()),
            install_dir: cli.dir.as_deref().map(expand_home),
            profile,
            dry_run: cli.dry_run,
            // Dry runs print their intent line by line, so the bar stays off.
            bar_mode: !(cli.verbose || verbose_env || cli.dry_run),
        }
    }
}

/// Expands a leading `~` the way a shell would for `--dir=~/bin`.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// True when `dir` is listed in `$PATH`.
pub fn dir_on_path(dir: &Path) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|p| p == dir))
        .unwrap_or(false)
}
