use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;

/// Streams `url` into `local_path`, reporting `(downloaded, total)` after each chunk.
pub async fn download_file<F>(
    client: &reqwest::Client,
    url: &str,
    local_path: &Path,
    mut on_progress: F,
) -> Result<()>
where
    F: FnMut(u64, Option<u64>),
{
    tracing::info!("Downloading {}...", url);

    let response = client.get(url).send().await?.error_for_status()?;
    let total_size = response.content_length();

    let mut file = fs::File::create(local_path)
        .with_context(|| format!("Could not create {}", local_path.display()))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        on_progress(downloaded, total_size);
    }
    file.flush()?;

    tracing::info!("Downloaded {} bytes to {}", downloaded, local_path.display());
    Ok(())
}

pub fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    tracing::info!(
        "Extracting {}...",
        archive_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    );

    let file = fs::File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    archive
        .unpack(extract_dir)
        .with_context(|| format!("Could not extract {}", archive_path.display()))?;

    Ok(())
}

/// Finds a file named exactly `binary_name` anywhere under `extract_dir`,
/// preferring the shallowest match.
pub fn find_binary(extract_dir: &Path, binary_name: &str) -> Option<PathBuf> {
    let mut candidates: Vec<(usize, PathBuf)> = WalkDir::new(extract_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == binary_name)
        .map(|e| (e.depth(), e.into_path()))
        .collect();

    candidates.sort_by_key(|(depth, _)| *depth);

    if let Some((depth, path)) = candidates.first() {
        tracing::debug!("Found {} at depth {}", path.display(), depth);
    }

    candidates.into_iter().map(|(_, path)| path).next()
}

/// Copies `source` to `dest_dir/name` and makes it executable.
pub fn install_binary(source: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let dest = dest_dir.join(name);

    // Replacing a running binary in place fails with ETXTBSY on Linux; unlink first.
    if dest.exists() {
        fs::remove_file(&dest)
            .with_context(|| format!("Could not replace {}", dest.display()))?;
    }

    fs::copy(source, &dest).with_context(|| {
        format!("Could not copy {} to {}", source.display(), dest.display())
    })?;
    set_executable(&dest)?;

    tracing::info!("Installed {}", dest.display());
    Ok(dest)
}

pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        if !path.is_file() {
            return Err(anyhow::anyhow!("{} is not a file", path.display()));
        }
    }
    Ok(())
}
