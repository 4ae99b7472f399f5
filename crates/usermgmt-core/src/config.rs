//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the server to talk to, the request timeout, where the session is kept,
//! and the last username used to log in.
//!
//! Configuration is stored at `~/.config/usermgmt/config.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::auth::{FileStore, KeychainStore, MemoryStore, SharedStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "usermgmt";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Server used when nothing is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Where the session mirror lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain via `keyring`
    Keychain,
    /// Nothing survives the process
    Memory,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Some(StorageBackend::File),
            "keychain" | "keyring" => Some(StorageBackend::Keychain),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn server_url(&self) -> &str {
        self.server_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Open the configured session store.
    pub fn open_store(&self) -> Result<SharedStore> {
        let store: SharedStore = match self.storage {
            StorageBackend::File => Arc::new(FileStore::open(&self.cache_dir()?)?),
            StorageBackend::Keychain => Arc::new(KeychainStore::new()),
            StorageBackend::Memory => MemoryStore::shared(),
        };
        Ok(store)
    }
}
