//! Configuration file handling for ~/.modeltiles/config.ini.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::request::DefaultRequestManager;
use crate::source::MapContext;
use crate::transport::DEFAULT_TIMEOUT_SECS;
use crate::worker::WorkerPoolConfig;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "modeltiles.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[http]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Request timeout in seconds
    pub timeout: u64,
    /// Token appended to index and tile URLs
    pub access_token: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            access_token: None,
        }
    }
}

/// `[workers]` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Worker count; `None` uses available parallelism
    pub count: Option<usize>,
}

/// `[tiles]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSettings {
    pub refresh_expired: bool,
    pub collect_resource_timing: bool,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            refresh_expired: true,
            collect_resource_timing: false,
        }
    }
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub http: HttpSettings,
    pub workers: WorkerSettings,
    pub tiles: TileSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.modeltiles/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        super::parser::to_ini(self)
            .write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Request manager carrying the configured access token and timing flag.
    pub fn request_manager(&self) -> DefaultRequestManager {
        let manager =
            DefaultRequestManager::new().with_resource_timing(self.tiles.collect_resource_timing);
        match &self.http.access_token {
            Some(token) => manager.with_access_token(token.clone()),
            None => manager,
        }
    }

    /// Map context built from these settings.
    pub fn map_context(&self) -> MapContext {
        MapContext::new(std::sync::Arc::new(self.request_manager()))
            .with_refresh_expired_tiles(self.tiles.refresh_expired)
    }

    /// Worker pool configuration.
    pub fn worker_pool_config(&self) -> WorkerPoolConfig {
        match self.workers.count {
            Some(count) => WorkerPoolConfig::default().with_workers(count),
            None => WorkerPoolConfig::default(),
        }
    }
}

/// Directory holding the configuration file, `~/.modeltiles`.
///
/// Falls back to the current directory when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".modeltiles")
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.http.timeout, 30);
        assert!(config.tiles.refresh_expired);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.http.timeout = 5;
        config.http.access_token = Some("pk.test".to_string());
        config.workers.count = Some(3);
        config.tiles.collect_resource_timing = true;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[workers]\ncount = many\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, .. } if section == "workers" && key == "count"
        ));
    }

    #[test]
    fn test_worker_pool_config() {
        let mut config = ConfigFile::default();
        config.workers.count = Some(2);
        assert_eq!(config.worker_pool_config().workers, 2);
    }

    #[test]
    fn test_config_path_under_directory() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(config_file_path().ends_with("config.ini"));
    }
}
