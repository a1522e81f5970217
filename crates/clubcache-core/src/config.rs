//! Application configuration management.
//!
//! Holds the remote service location and credentials, whether caching is on,
//! and per-entity TTL overrides in seconds.
//!
//! Configuration is stored at `~/.config/clubcache/config.json`.
//! `CLUBCACHE_REMOTE_URL` and `CLUBCACHE_API_KEY` override the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::TtlPolicy;
use crate::entity::Entity;

/// Application name used for the config directory path
const APP_NAME: &str = "clubcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_REMOTE_URL: &str = "CLUBCACHE_REMOTE_URL";
pub const ENV_API_KEY: &str = "CLUBCACHE_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote_url: Option<String>,
    pub api_key: Option<String>,
    pub cache_enabled: bool,
    /// Per-entity TTL overrides, e.g. `{"players": 300}`.
    pub ttl_seconds: HashMap<Entity, u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            api_key: None,
            cache_enabled: true,
            ttl_seconds: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from the default path, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Replace file values with non-empty values from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_REMOTE_URL) {
            self.remote_url = Some(url);
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
    }

    pub fn remote_url(&self) -> Result<&str> {
        self.remote_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No remote URL configured; set {} or add remote_url to the config file", ENV_REMOTE_URL)
        })
    }

    /// TTL policy with this config's overrides on top of the entity defaults.
    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ttl_seconds
            .iter()
            .fold(TtlPolicy::new(), |policy, (entity, secs)| {
                policy.with_override(*entity, Duration::from_secs(*secs))
            })
    }
}
