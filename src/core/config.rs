/*
 * Manages the application's persisted settings: which editor to launch, the
 * flag that asks it for a new window, scan exclude patterns, and the vault
 * that was opened last. Settings are stored as JSON in the application's local
 * configuration directory (see `path_utils::get_base_app_config_local_dir`).
 *
 * Access goes through the `ConfigManagerOperations` trait so the presenter can
 * be tested with an in-memory implementation. `CoreConfigManager` is the
 * file-backed one.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_EDITOR_COMMAND: &str = "cursor";
pub const DEFAULT_WINDOW_FLAG: &str = "--new-window";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    NoProjectDirectory,
    Json(serde_json::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine directory for configuration")
            }
            ConfigError::Json(e) => write!(f, "Configuration file format error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub editor_command: String,
    pub window_flag: String,
    pub exclude_patterns: Vec<String>,
    pub last_vault_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            editor_command: DEFAULT_EDITOR_COMMAND.to_string(),
            window_flag: DEFAULT_WINDOW_FLAG.to_string(),
            exclude_patterns: Vec::new(),
            last_vault_path: None,
        }
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, app_name: &str) -> Result<AppConfig>;
    fn save_config(&self, app_name: &str, config: &AppConfig) -> Result<()>;
}

/*
 * File-backed configuration. By default the directory is resolved per
 * application name through `path_utils`; `with_config_dir` pins it, which is
 * what the tests use.
 */
pub struct CoreConfigManager {
    config_dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {
            config_dir_override: None,
        }
    }

    #[cfg(test)]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        CoreConfigManager {
            config_dir_override: Some(config_dir),
        }
    }

    fn config_file_path(&self, app_name: &str) -> Result<PathBuf> {
        let config_dir = match &self.config_dir_override {
            Some(dir) => dir.clone(),
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(ConfigError::NoProjectDirectory)?,
        };
        Ok(config_dir.join(CONFIG_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * Loads the configuration, falling back to defaults when the file does not
     * exist or is empty. Fields missing from the file take their default values.
     */
    fn load_config(&self, app_name: &str) -> Result<AppConfig> {
        let file_path = self.config_file_path(app_name)?;
        log::trace!("CoreConfigManager: Loading config for app '{app_name}' from {file_path:?}");

        if !file_path.exists() {
            log::debug!("CoreConfigManager: Config file {file_path:?} does not exist, using defaults.");
            return Ok(AppConfig::default());
        }

        let contents = fs::read_to_string(&file_path)?;
        if contents.trim().is_empty() {
            log::debug!("CoreConfigManager: Config file {file_path:?} is empty, using defaults.");
            return Ok(AppConfig::default());
        }

        let config: AppConfig = serde_json::from_str(&contents)?;
        log::debug!("CoreConfigManager: Loaded config from {file_path:?}: {config:?}");
        Ok(config)
    }

    fn save_config(&self, app_name: &str, config: &AppConfig) -> Result<()> {
        let file_path = self.config_file_path(app_name)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&file_path, json)?;
        log::debug!("CoreConfigManager: Saved config for app '{app_name}' to {file_path:?}.");
        Ok(())
    }
}
