use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::default_data_dir;

pub const CREDENTIAL_ENV: &str = "REPLICATE_API_TOKEN";
pub const DATA_DIR_ENV: &str = "PIXELPROMPT_DATA_DIR";

const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "pixelprompt.db";
const LOG_DIR: &str = "logs";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub model: String,
    pub poll_interval_ms: u64,
    /// Upper bound on a whole generation call; `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub download_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com".to_string(),
            model: "black-forest-labs/flux-schnell".to_string(),
            poll_interval_ms: 500,
            request_timeout_secs: None,
            download_file_name: "generated_image.webp".to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or fall back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Where the app keeps its database, config and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    /// Explicit override first, then `PIXELPROMPT_DATA_DIR`, then the platform data dir.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self { root });
        }
        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self {
                root: PathBuf::from(root),
            });
        }
        let root = default_data_dir().map_err(anyhow::Error::msg)?;
        Ok(Self { root })
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn db_file(&self) -> PathBuf {
        self.root.join(DB_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }
}

/// Startup seed for the credential; blank values count as unset.
pub fn default_credential_from_env() -> Option<String> {
    std::env::var(CREDENTIAL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
}
