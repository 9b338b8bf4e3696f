use std::path::PathBuf;
use thiserror::Error;

/// Conditions that end the run with exit code 1.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("invalid profile '{0}' (expected desktop, terminal or server)")]
    InvalidProfile(String),

    #[error("`{0}` is required to build from source but was not found on PATH")]
    ToolchainMissing(String),

    #[error("build of {package} failed")]
    BuildFailed { package: String },

    #[error("{path} is not a valid JSON config: {reason}")]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("could not configure {}", clients.join(", "))]
    ClientConfigFailed { clients: Vec<String> },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl InstallError {
    /// Remediation shown under the error line, when one exists.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            InstallError::MissingDependency(_) => {
                Some("set HOME to your home directory and re-run the installer")
            }
            InstallError::UnsupportedPlatform { .. } => {
                Some("pre-built binaries exist for darwin and linux on x86_64 and aarch64 only")
            }
            InstallError::ToolchainMissing(_) => {
                Some("install Rust from https://rustup.rs and re-run the installer")
            }
            InstallError::BuildFailed { .. } => {
                Some("re-run with --verbose for full build logs")
            }
            InstallError::MalformedConfig { .. } | InstallError::ClientConfigFailed { .. } => {
                Some("fix or remove the file, then re-run the installer")
            }
            InstallError::InvalidProfile(_) | InstallError::Io(_) => None,
        }
    }
}
