use std::path::PathBuf;

use clap::Subcommand;
use tracing::{debug, error, info, instrument};

use crate::config::{get_config_path, AppConfig};
use crate::errors::Error;

#[cfg(test)]
#[path = "config_cmd_tests.rs"]
mod tests;

/// Subcommands for the config command
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Create initial configuration file
    Init,

    /// Show current configuration
    Show,
}

/// Execute the config command
#[instrument]
pub async fn execute(cmd: ConfigCommands, config_path: Option<&str>) -> Result<(), Error> {
    match cmd {
        ConfigCommands::Init => {
            let path = init_config(config_path)?;
            println!("Configuration written to {}", path.display());
        }
        ConfigCommands::Show => println!("{}", show_config(config_path)?),
    }
    Ok(())
}

/// Writes a default configuration file. An existing file is never
/// overwritten.
#[instrument]
pub fn init_config(path: Option<&str>) -> Result<PathBuf, Error> {
    let config_path = get_config_path(path);
    debug!(message = "Initializing configuration", path = ?config_path);

    if config_path.exists() {
        let err = Error::Config(format!(
            "Configuration file already exists at {:?}",
            config_path
        ));
        error!(message = "Configuration file already exists", path = ?config_path);
        return Err(err);
    }

    AppConfig::default().save(&config_path)?;
    info!(message = "Configuration initialized", path = ?config_path);
    Ok(config_path)
}

/// The effective configuration, defaults included, as TOML.
pub fn show_config(path: Option<&str>) -> Result<String, Error> {
    let config = AppConfig::load(&get_config_path(path))?;
    toml::to_string_pretty(&config)
        .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))
}
