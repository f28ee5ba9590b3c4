//! patchgrid.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "patchgrid.toml";

/// Role whose hosts are confined to patch groups 1 and 2.
pub const DEFAULT_RESERVED_ROLE: &str = "be-sharddb";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchgridConfig {
    pub inventory: InventoryConfig,
    pub runner: RunnerConfig,
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// GCP project. Falls back to `gcloud config get-value project`.
    pub project: Option<String>,
    /// Inline filter terms. Takes precedence over `scope_file`.
    pub scope: Option<Vec<String>>,
    pub scope_file: PathBuf,
    pub role_label_prefix: String,
    pub region_label: String,
    pub reserved_role: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            project: None,
            scope: None,
            scope_file: PathBuf::from("scope"),
            role_label_prefix: "role".to_string(),
            region_label: "region".to_string(),
            reserved_role: DEFAULT_RESERVED_ROLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub program: String,
    pub static_inventory: PathBuf,
    /// Directory holding the playbook; `.retry` files are scraped from here.
    pub playbook_dir: PathBuf,
    pub playbook: String,
    /// Remote user for the deploy identity. Falls back to `$DEPLOY`.
    pub deploy_user: Option<String>,
    /// Defaults to `~/.ssh/deploy`.
    pub deploy_key: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "ansible-playbook".to_string(),
            static_inventory: PathBuf::from("/etc/ansible/inventory.gcp.yaml"),
            playbook_dir: PathBuf::from("."),
            playbook: "main.yaml".to_string(),
            deploy_user: None,
            deploy_key: None,
        }
    }
}

impl RunnerConfig {
    pub fn playbook_path(&self) -> PathBuf {
        self.playbook_dir.join(&self.playbook)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent of the per-run `patch-<timestamp>` directories. Defaults to `$HOME`.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not determine home directory")]
    NoHome,
}

impl PatchgridConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicit config file, or `./patchgrid.toml` when present, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn workspace_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.workspace.root {
            Some(root) => Ok(root.clone()),
            None => dirs::home_dir().ok_or(ConfigError::NoHome),
        }
    }

    pub fn deploy_key(&self) -> Result<PathBuf, ConfigError> {
        match &self.runner.deploy_key {
            Some(key) => Ok(key.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".ssh").join("deploy"))
                .ok_or(ConfigError::NoHome),
        }
    }
}
