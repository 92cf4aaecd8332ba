//! Configuration management for the commission admin CLI.
//!
//! The CLI configuration is a TOML file naming the data file that holds the
//! persisted commission state, the operator whose identity is attached to
//! audit events, and the engine settings (`[cache]`). It is loaded from a
//! path given on the command line or from `commission.toml` in the current
//! directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use commission_manager::{ActorContext, CommissionSettings, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "commission.toml";

/// Default name of the commission data file
pub const DEFAULT_DATA_FILENAME: &str = "commissions.json";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the commission admin CLI.
///
/// # Example TOML Configuration
///
/// ```toml
/// data_file = "commissions.json"
///
/// [operator]
/// id = 1
/// email = "admin@example.com"
///
/// [cache]
/// enabled = true
/// ttl_seconds = 36000000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the JSON data file. Relative paths are resolved against the
    /// directory of the configuration file.
    #[serde(default = "AppConfig::default_data_file")]
    pub data_file: PathBuf,

    /// Identity recorded as the actor of every change.
    #[serde(default)]
    pub operator: OperatorConfig,

    /// Commission engine settings
    #[serde(flatten)]
    pub engine: CommissionSettings,
}

impl AppConfig {
    fn default_data_file() -> PathBuf {
        PathBuf::from(DEFAULT_DATA_FILENAME)
    }

    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read, or
    /// does not contain a valid configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use commission_cli::config::AppConfig;
    ///
    /// match AppConfig::load(Path::new("./commission.toml")) {
    ///     Ok(config) => println!("Data file: {:?}", config.data_file),
    ///     Err(e) => eprintln!("Failed to load config: {}", e),
    /// }
    /// ```
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// Saves the configuration to a TOML file, creating parent directories
    /// as needed. An existing file is overwritten.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        debug!("Saving configuration to {:?}", path);

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write configuration file: {}", e)))?;

        info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Location of the data file for a configuration loaded from
    /// `config_path`.
    pub fn data_path(&self, config_path: &Path) -> PathBuf {
        if self.data_file.is_absolute() {
            return self.data_file.clone();
        }

        match config_path.parent() {
            Some(dir) => dir.join(&self.data_file),
            None => self.data_file.clone(),
        }
    }

    /// The operator as the actor of audited changes.
    pub fn actor(&self) -> ActorContext {
        ActorContext::new(UserId::new(self.operator.id), self.operator.email.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: Self::default_data_file(),
            operator: OperatorConfig::default(),
            engine: CommissionSettings::default(),
        }
    }
}

/// The administrator running the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub id: i64,
    pub email: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            id: 0,
            email: "admin@localhost".to_string(),
        }
    }
}

/// Resolves the configuration file path.
///
/// Uses `config_path` when given, otherwise [`DEFAULT_CONFIG_FILENAME`] in
/// the current directory.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
