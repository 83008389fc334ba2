//! Server configuration
//!
//! Loaded from a JSON file (default `~/.tasktree/config.json`), with
//! environment overrides for the settings worth flipping per run.
//! All fields use #[serde(default)] so existing config files without
//! newer fields keep deserializing without error.
//!
//! # Environment Variables
//!
//! - `TASKTREE_CONFIG`: path to the config file
//! - `TASKTREE_DB`: database file path (overrides the config file)
//! - `TASKTREE_PORT`: HTTP port (overrides the config file)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Top-level server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Database file path; defaults to `~/.tasktree/tasktree.db`
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    4680
}

/// Background cache reconciliation settings
///
/// The reconciler periodically drops cache relations for rows deleted
/// out of band (manual SQL, another process).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_reconcile_enabled")]
    pub enabled: bool,

    #[serde(default = "default_reconcile_interval")]
    pub interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: default_reconcile_enabled(),
            interval_secs: default_reconcile_interval(),
        }
    }
}

fn default_reconcile_enabled() -> bool {
    true
}

fn default_reconcile_interval() -> u64 {
    300
}

impl ServerConfig {
    /// Load configuration: config file first, then environment
    /// overrides. A missing config file yields defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
            serde_json::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?
        } else {
            Self::default()
        };

        if let Ok(db) = env::var("TASKTREE_DB") {
            config.database_path = Some(PathBuf::from(db));
        }
        if let Some(port) = env::var("TASKTREE_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            config.http.port = port;
        }

        Ok(config)
    }

    /// Resolve the database path, falling back to the default under the
    /// home directory.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
        Ok(home.join(".tasktree").join("tasktree.db"))
    }

    fn config_path() -> anyhow::Result<PathBuf> {
        if let Ok(custom) = env::var("TASKTREE_CONFIG") {
            return Ok(PathBuf::from(custom));
        }

        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
        Ok(home.join(".tasktree").join(CONFIG_FILE))
    }
}
