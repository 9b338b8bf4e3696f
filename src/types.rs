use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::InstallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallProfile {
    #[default]
    Desktop,
    Terminal,
    Server,
}

impl InstallProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallProfile::Desktop => "desktop",
            InstallProfile::Terminal => "terminal",
            InstallProfile::Server => "server",
        }
    }

    /// Only the desktop profile wires the server into client configs.
    pub fn configures_clients(&self) -> bool {
        matches!(self, InstallProfile::Desktop)
    }
}

impl FromStr for InstallProfile {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desktop" => Ok(InstallProfile::Desktop),
            "terminal" => Ok(InstallProfile::Terminal),
            "server" => Ok(InstallProfile::Server),
            _ => Err(InstallError::InvalidProfile(s.to_string())),
        }
    }
}

impl fmt::Display for InstallProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Darwin,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformId {
    pub os: Os,
    pub arch: Arch,
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = match self.os {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
        };
        let arch = match self.arch {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
        };
        write!(f, "{}-{}", os, arch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRef {
    Latest,
    Tag(String),
}

impl VersionRef {
    pub fn parse(requested: Option<&str>) -> Self {
        match requested.map(str::trim) {
            None | Some("") | Some("latest") => VersionRef::Latest,
            Some(tag) => VersionRef::Tag(tag.to_string()),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VersionRef::Latest => None,
            VersionRef::Tag(tag) => Some(tag),
        }
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRef::Latest => f.write_str("latest"),
            VersionRef::Tag(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    Resolved(String),
    Unavailable,
}

/// One binary the install is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySpec {
    pub name: String,
    /// Cargo package that builds this binary in the source fallback.
    pub package: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactManifest {
    pub binaries: Vec<BinarySpec>,
}

impl ArtifactManifest {
    pub fn server(&self) -> Option<&BinarySpec> {
        self.binaries.iter().find(|b| b.required)
    }
}

impl Default for ArtifactManifest {
    fn default() -> Self {
        Self {
            binaries: vec![
                BinarySpec {
                    name: crate::config::CLI_BINARY.to_string(),
                    package: crate::config::CLI_PACKAGE.to_string(),
                    required: false,
                },
                BinarySpec {
                    name: crate::config::SERVER_BINARY.to_string(),
                    package: crate::config::SERVER_PACKAGE.to_string(),
                    required: true,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub install_dir: PathBuf,
    pub manifest: ArtifactManifest,
}

impl InstallTarget {
    pub fn binary_path(&self, name: &str) -> PathBuf {
        self.install_dir.join(name)
    }

    pub fn server_command(&self) -> Option<PathBuf> {
        self.manifest.server().map(|b| self.binary_path(&b.name))
    }
}

/// What a completed install placed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<PathBuf>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Success(InstallReport),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerEntry {
    pub command: String,
    pub args: Vec<String>,
}

impl McpServerEntry {
    pub fn serve(command: &str) -> Self {
        Self {
            command: command.to_string(),
            args: vec!["serve".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    #[serde(default)]
    pub tag_name: Option<String>,
}
