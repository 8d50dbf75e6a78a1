//! Application Configuration
//! 
//! Manages all PermToggle settings including:
//! - Toggle reconciliation behaviour (strict per-permission mode, special groups)
//! - Logging

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{PermToggleError, Result};

/// Permission group whose members never get individual rows in strict mode
pub const STORAGE_GROUP: &str = "android.permission-group.STORAGE";

/// Permission group routed to the location settings dialog for provider apps
pub const LOCATION_GROUP: &str = "android.permission-group.LOCATION";

/// Toggle reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToggleConfig {
    /// Expose dangerous platform permissions as individual switches
    pub strict_mode: bool,
    /// Storage permission group name
    pub storage_group: String,
    /// Location permission group name
    pub location_group: String,
    /// Packages acting as location providers
    pub location_providers: Vec<String>,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            storage_group: STORAGE_GROUP.to_string(),
            location_group: LOCATION_GROUP.to_string(),
            location_providers: Vec::new(),
        }
    }
}

impl ToggleConfig {
    /// Whether `group` is the location group and `package` one of its providers
    pub fn is_location_group_and_provider(&self, group: &str, package: &str) -> bool {
        group == self.location_group && self.location_providers.iter().any(|p| p == package)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by RUST_LOG)
    pub level: String,
    /// Include source file and line in log records
    pub with_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_file: false,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Toggle settings
    pub toggles: ToggleConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            toggles: ToggleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "permtoggle", "PermToggle")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location, writing defaults if absent
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| PermToggleError::Config("Cannot determine config path".into()))?;

        if config_file.exists() {
            Self::load_from(&config_file).await
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(&config_file).await?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit path
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| PermToggleError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to an explicit path
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }
}
