//! Configuration Management
//!
//! Handles persistent configuration storage for ledger-console.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger URL used when nothing else is configured
pub const DEFAULT_URL: &str = "http://localhost:1999";

/// Environment variable overriding the configured ledger URL
pub const URL_ENV: &str = "LEDGER_CONSOLE_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Ledger server URL
    #[serde(default)]
    pub url: Option<String>,
    /// Items per list page
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Last listed resource kind
    #[serde(default)]
    pub last_resource: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ledger-console").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parse config text, falling back to defaults on malformed input
    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective ledger URL (CLI > env > config > default)
    pub fn effective_url(&self, cli: Option<&str>) -> String {
        let env = std::env::var(URL_ENV).ok();
        Self::resolve_url(cli, env.as_deref(), self.url.as_deref())
    }

    fn resolve_url(cli: Option<&str>, env: Option<&str>, configured: Option<&str>) -> String {
        [cli, env, configured]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_URL)
            .to_string()
    }

    /// Set last listed resource and save
    pub fn set_last_resource(&mut self, resource: &str) -> Result<()> {
        self.last_resource = Some(resource.to_string());
        self.save()
    }
}
