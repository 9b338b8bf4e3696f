//! Non-destructive merge of the MCP server entry into a client's JSON config.
//!
//! Only `mcpServers.<key>` is ever written. Every other key, including the
//! other servers under `mcpServers`, keeps its value and position.

use crate::error::InstallError;
use crate::types::McpServerEntry;
use anyhow::Context;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const MCP_SERVERS_KEY: &str = "mcpServers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
    Unchanged,
    DryRun,
}

/// Document containing nothing but the one server entry.
pub fn fresh_document(server_key: &str, entry: &McpServerEntry) -> Value {
    let mut servers = Map::new();
    servers.insert(server_key.to_string(), entry_value(entry));
    let mut root = Map::new();
    root.insert(MCP_SERVERS_KEY.to_string(), Value::Object(servers));
    Value::Object(root)
}

/// Sets `mcpServers[server_key]` in `document`, creating `mcpServers` when it
/// is absent or not an object. Fails only when the root is not an object.
pub fn merge_into(
    mut document: Value,
    server_key: &str,
    entry: &McpServerEntry,
) -> Result<Value, String> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| "top-level value is not a JSON object".to_string())?;

    let servers = root
        .entry(MCP_SERVERS_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !servers.is_object() {
        tracing::warn!("Replacing non-object {} value", MCP_SERVERS_KEY);
        *servers = Value::Object(Map::new());
    }

    if let Some(servers) = servers.as_object_mut() {
        servers.insert(server_key.to_string(), entry_value(entry));
    }
    Ok(document)
}

pub fn render(document: &Value) -> Result<String, InstallError> {
    let mut text = serde_json::to_string_pretty(document).context("Could not serialize config")?;
    text.push('\n');
    Ok(text)
}

/// Merge the server entry into the config file at `path`
///
/// # Arguments
/// * `path` - Client config file; it and its parent directory are created if missing
/// * `server_key` - Key under `mcpServers`
/// * `command` - Absolute path of the server binary
/// * `dry_run` - Report only, touch nothing
pub fn merge_server_entry(
    path: &Path,
    server_key: &str,
    command: &Path,
    dry_run: bool,
) -> Result<MergeOutcome, InstallError> {
    let entry = McpServerEntry::serve(&command.to_string_lossy());

    let existing = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?
    } else {
        String::new()
    };

    let malformed = |reason: String| InstallError::MalformedConfig {
        path: path.to_path_buf(),
        reason,
    };

    // Parsed before the dry-run check so a broken file is reported either way.
    let original = if existing.trim().is_empty() {
        None
    } else {
        let value: Value =
            serde_json::from_str(&existing).map_err(|e| malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(malformed("top-level value is not a JSON object".to_string()));
        }
        Some(value)
    };

    if dry_run {
        tracing::info!(
            "[dry-run] would set {}.{} in {}",
            MCP_SERVERS_KEY,
            server_key,
            path.display()
        );
        return Ok(MergeOutcome::DryRun);
    }

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Could not create {}", parent.display()))?;

    let Some(original) = original else {
        let text = render(&fresh_document(server_key, &entry))?;
        fs::write(path, text).with_context(|| format!("Could not write {}", path.display()))?;
        tracing::info!("Created {}", path.display());
        return Ok(MergeOutcome::Created);
    };

    let merged = merge_into(original.clone(), server_key, &entry).map_err(malformed)?;

    if merged == original {
        tracing::info!("{} already up to date", path.display());
        return Ok(MergeOutcome::Unchanged);
    }

    write_atomic(path, parent, &render(&merged)?)?;
    tracing::info!("Updated {}", path.display());
    Ok(MergeOutcome::Updated)
}

fn entry_value(entry: &McpServerEntry) -> Value {
    serde_json::json!({
        "command": entry.command,
        "args": entry.args,
    })
}

/// Writes through a sibling temp file and renames it over `path`, keeping
/// the original file's permissions.
fn write_atomic(path: &Path, dir: &Path, content: &str) -> Result<(), InstallError> {
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Could not create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.flush())
        .context("Could not write temp config")?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())
            .context("Could not copy config permissions")?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Could not replace {}", path.display()))?;
    Ok(())
}
