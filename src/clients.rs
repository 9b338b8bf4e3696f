use crate::config::HostDirs;
use crate::merge::{merge_server_entry, MergeOutcome};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPolicy {
    /// Config file is created if it does not exist yet.
    CreateIfMissing,
    /// Only merged when this directory already exists.
    RequireMarker(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfigFile {
    pub name: &'static str,
    pub path: PathBuf,
    pub policy: ClientPolicy,
}

impl ClientConfigFile {
    pub fn detected(&self) -> bool {
        match &self.policy {
            ClientPolicy::CreateIfMissing => true,
            ClientPolicy::RequireMarker(marker) => marker.is_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientStatus {
    Configured(MergeOutcome),
    NotDetected,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResult {
    pub name: &'static str,
    pub path: PathBuf,
    pub status: ClientStatus,
}

/// Config files of the MCP clients this installer knows how to wire up.
pub fn known_clients(dirs: &HostDirs) -> Vec<ClientConfigFile> {
    let claude_code_dir = dirs.home.join(".claude");
    vec![
        ClientConfigFile {
            name: "Claude Desktop",
            path: dirs.config.join("Claude").join("claude_desktop_config.json"),
            policy: ClientPolicy::CreateIfMissing,
        },
        ClientConfigFile {
            name: "Claude Code",
            path: claude_code_dir.join("mcp.json"),
            policy: ClientPolicy::RequireMarker(claude_code_dir),
        },
    ]
}

/// Merges the server entry into every detected client. One client failing
/// does not stop the others.
pub fn configure_clients(
    clients: &[ClientConfigFile],
    server_key: &str,
    command: &Path,
    dry_run: bool,
) -> Vec<ClientResult> {
    clients
        .iter()
        .map(|client| {
            let status = if !client.detected() {
                tracing::info!("{} not detected, skipping", client.name);
                ClientStatus::NotDetected
            } else {
                match merge_server_entry(&client.path, server_key, command, dry_run) {
                    Ok(outcome) => ClientStatus::Configured(outcome),
                    Err(e) => {
                        tracing::error!("Could not configure {}: {}", client.name, e);
                        ClientStatus::Failed(e.to_string())
                    }
                }
            };

            ClientResult {
                name: client.name,
                path: client.path.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn host_dirs(root: &Path) -> HostDirs {
        HostDirs {
            home: root.join("home"),
            config: root.join("home").join(".config"),
        }
    }

    #[test]
    fn test_desktop_created_code_skipped_without_marker() {
        let temp = TempDir::new().unwrap();
        let dirs = host_dirs(temp.path());
        let clients = known_clients(&dirs);

        let results = configure_clients(
            &clients,
            "agentic-memory",
            Path::new("/opt/bin/agentic-memory-mcp"),
            false,
        );

        assert_eq!(results[0].status, ClientStatus::Configured(MergeOutcome::Created));
        assert!(results[0].path.is_file());
        assert_eq!(results[1].status, ClientStatus::NotDetected);
        assert!(!dirs.home.join(".claude").exists());
    }

    #[test]
    fn test_one_client_failure_does_not_block_other() {
        let temp = TempDir::new().unwrap();
        let dirs = host_dirs(temp.path());
        let clients = known_clients(&dirs);

        fs::create_dir_all(clients[0].path.parent().unwrap()).unwrap();
        fs::write(&clients[0].path, "{ broken").unwrap();
        fs::create_dir_all(dirs.home.join(".claude")).unwrap();

        let results = configure_clients(
            &clients,
            "agentic-memory",
            Path::new("/opt/bin/agentic-memory-mcp"),
            false,
        );

        assert!(matches!(results[0].status, ClientStatus::Failed(_)));
        assert_eq!(results[1].status, ClientStatus::Configured(MergeOutcome::Created));
        assert!(dirs.home.join(".claude").join("mcp.json").is_file());
    }
}
