use fitlog_core::{DriveConfig, OAuthConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote backup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// OAuth client id registered with the provider
    pub client_id: Option<String>,
    /// OAuth client secret (only needed for "web application" clients)
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    /// Upload after every successful write command (default: true)
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    /// Remote folder holding the backup
    pub folder_name: Option<String>,
    /// Backup file name inside the folder
    pub file_name: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            auto_sync: true,
            folder_name: None,
            file_name: None,
        }
    }
}

impl SyncConfig {
    /// Returns true if an OAuth client is configured
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some()
    }

    /// Provider settings for the given loopback redirect.
    pub fn oauth_config(&self, redirect_uri: &str) -> Option<OAuthConfig> {
        let client_id = self.client_id.as_ref()?;
        let oauth = OAuthConfig::google(client_id, redirect_uri);
        Some(match &self.client_secret {
            Some(secret) => oauth.with_client_secret(secret),
            None => oauth,
        })
    }

    pub fn drive_config(&self) -> DriveConfig {
        let mut drive = DriveConfig::default();
        if let Some(folder) = &self.folder_name {
            drive = drive.with_folder_name(folder);
        }
        if let Some(file) = &self.file_name {
            drive = drive.with_file_name(file);
        }
        drive
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding one JSON document per store key
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        if let Ok(dir) = std::env::var("FITLOG_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(client_id) = std::env::var("FITLOG_CLIENT_ID") {
            sync.client_id = Some(client_id);
        }
        if let Ok(secret) = std::env::var("FITLOG_CLIENT_SECRET") {
            sync.client_secret = Some(secret);
        }

        Ok(Self {
            data_dir,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/fitlog/
    /// - macOS: ~/Library/Application Support/fitlog/
    /// - Windows: %APPDATA%/fitlog/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitlog")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/fitlog/
    /// - macOS: ~/Library/Application Support/fitlog/
    /// - Windows: %APPDATA%/fitlog/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitlog")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
