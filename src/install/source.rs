use crate::download::{find_binary, install_binary};
use crate::error::InstallError;
use crate::progress::{MonitorOutcome, ProgressReporter, Window};
use crate::types::*;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub const SOURCE_WINDOW: Window = Window::new(10, 90);

pub struct CargoSource {
    pub git_url: String,
    pub dry_run: bool,
}

impl CargoSource {
    /// Locates `cargo` on PATH; its absence ends the run.
    pub fn find_cargo() -> Result<PathBuf, InstallError> {
        which::which("cargo").map_err(|_| InstallError::ToolchainMissing("cargo".to_string()))
    }

    pub fn install_args(&self, package: &str, requested: &VersionRef) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            "--git".to_string(),
            self.git_url.clone(),
        ];
        if let Some(tag) = requested.tag() {
            args.push("--tag".to_string());
            args.push(tag.to_string());
        }
        args.push("--force".to_string());
        args.push(package.to_string());
        args
    }

    /// Build every manifest binary with `cargo install`, one monitored phase each,
    /// then copy the results into the install directory.
    pub async fn build_and_install(
        &self,
        requested: &VersionRef,
        target: &InstallTarget,
        cargo_bin_dir: &Path,
        reporter: &mut ProgressReporter,
    ) -> Result<InstallReport, InstallError> {
        let cargo = Self::find_cargo()?;
        tracing::info!("Building from source with {}", cargo.display());

        if self.dry_run {
            for binary in &target.manifest.binaries {
                reporter.println(format!(
                    "[dry-run] would run: cargo {}",
                    self.install_args(&binary.package, requested).join(" ")
                ));
            }
            reporter.println(format!(
                "[dry-run] would copy binaries from {} into {}",
                cargo_bin_dir.display(),
                target.install_dir.display()
            ));
            return Ok(InstallReport::default());
        }

        let windows = split_window(SOURCE_WINDOW, target.manifest.binaries.len());
        for (binary, window) in target.manifest.binaries.iter().zip(windows) {
            let mut command = Command::new(&cargo);
            command.args(self.install_args(&binary.package, requested));

            let label = format!("Building {} from source", binary.package);
            match reporter.run_monitored(window, &label, command).await? {
                MonitorOutcome::Success => {}
                MonitorOutcome::Failure(tail) => {
                    tracing::debug!("Build output of {}:\n{}", binary.package, tail);
                    return Err(InstallError::BuildFailed {
                        package: binary.package.clone(),
                    })
                }
            }
        }

        copy_built_binaries(cargo_bin_dir, target)
    }
}

/// Splits `window` into `parts` consecutive sub-windows.
pub fn split_window(window: Window, parts: usize) -> Vec<Window> {
    if parts == 0 {
        return Vec::new();
    }
    (0..parts)
        .map(|i| {
            Window::new(
                window.at(i as f64 / parts as f64),
                window.at((i + 1) as f64 / parts as f64),
            )
        })
        .collect()
}

fn copy_built_binaries(
    cargo_bin_dir: &Path,
    target: &InstallTarget,
) -> Result<InstallReport, InstallError> {
    fs::create_dir_all(&target.install_dir)
        .with_context(|| format!("Could not create {}", target.install_dir.display()))?;

    let mut report = InstallReport::default();
    for binary in &target.manifest.binaries {
        let built = cargo_bin_dir.join(&binary.name);
        let found = if built.is_file() {
            Some(built)
        } else {
            find_binary(cargo_bin_dir, &binary.name)
        };

        match found {
            Some(path) => {
                report
                    .installed
                    .push(install_binary(&path, &target.install_dir, &binary.name)?);
            }
            None if binary.required => {
                tracing::error!("{} was not produced by the build", binary.name);
                return Err(InstallError::BuildFailed {
                    package: binary.package.clone(),
                });
            }
            None => report
                .notices
                .push(format!("{} was not produced by the source build", binary.name)),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cargo_source() -> CargoSource {
        CargoSource {
            git_url: "https://github.com/agentralabs/agentic-memory".to_string(),
            dry_run: false,
        }
    }

    #[test]
    fn test_install_args_pin_tag() {
        let source = cargo_source();

        assert_eq!(
            source.install_args("agentic-memory-mcp", &VersionRef::Tag("v1.2.0".to_string())),
            vec![
                "install",
                "--git",
                "https://github.com/agentralabs/agentic-memory",
                "--tag",
                "v1.2.0",
                "--force",
                "agentic-memory-mcp"
            ]
        );
        assert!(!source
            .install_args("agentic-memory", &VersionRef::Latest)
            .contains(&"--tag".to_string()));
    }

    #[test]
    fn test_split_window() {
        assert_eq!(
            split_window(SOURCE_WINDOW, 2),
            vec![Window::new(10, 50), Window::new(50, 90)]
        );
        assert!(split_window(SOURCE_WINDOW, 0).is_empty());
    }

    #[test]
    fn test_copy_built_binaries() {
        let temp = tempfile::tempdir().unwrap();
        let cargo_bin = temp.path().join("cargo-bin");
        fs::create_dir_all(&cargo_bin).unwrap();
        fs::write(cargo_bin.join("agentic-memory-mcp"), b"server").unwrap();

        let target = InstallTarget {
            install_dir: temp.path().join("bin"),
            manifest: ArtifactManifest::default(),
        };

        let report = copy_built_binaries(&cargo_bin, &target).unwrap();
        assert_eq!(report.installed, vec![target.install_dir.join("agentic-memory-mcp")]);
        assert_eq!(report.notices.len(), 1);

        fs::remove_file(cargo_bin.join("agentic-memory-mcp")).unwrap();
        assert!(matches!(
            copy_built_binaries(&cargo_bin, &target),
            Err(InstallError::BuildFailed { .. })
        ));
    }
}
