use crate::error::InstallError;
use crate::types::*;

/// Identifies the host the installer is running on.
pub fn get_system_info() -> Result<PlatformId, InstallError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    tracing::debug!("Host reports OS '{}', ARCH '{}'", os, arch);
    from_parts(os, arch)
}

/// Maps raw OS and machine names onto a supported platform.
/// Accepts both Rust target names and `uname` spellings.
pub fn from_parts(os: &str, arch: &str) -> Result<PlatformId, InstallError> {
    let unsupported = || InstallError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    };

    let normalized_os = match os.to_lowercase().as_str() {
        "linux" => Os::Linux,
        "darwin" | "macos" => Os::Darwin,
        _ => return Err(unsupported()),
    };

    let normalized_arch = match arch.to_lowercase().as_str() {
        "x86_64" | "amd64" => Arch::X86_64,
        "aarch64" | "arm64" => Arch::Aarch64,
        _ => return Err(unsupported()),
    };

    Ok(PlatformId {
        os: normalized_os,
        arch: normalized_arch,
    })
}
