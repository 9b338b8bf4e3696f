use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub home: PathBuf,
    pub config_home: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("home");
        let config_home = home.join(".config");
        fs::create_dir_all(&home).expect("Failed to create fake home");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_amem-install"));

        Self {
            _temp_dir: temp_dir,
            home,
            config_home,
            bin_path,
        }
    }

    /// Command isolated from the caller's home, config and overrides.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("HOME", &self.home);
        cmd.env("XDG_CONFIG_HOME", &self.config_home);
        cmd.env("CARGO_HOME", self.home.join(".cargo"));
        cmd.env_remove("AGENTRA_INSTALL_PROFILE");
        cmd.env_remove("AGENTRA_INSTALL_VERBOSE");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Every file under the fake home.
    pub fn files_in_home(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(&self.home, &mut files);
        files
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_files(&path, files);
            } else {
                files.push(path);
            }
        }
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_exit_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Unexpected exit status\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
