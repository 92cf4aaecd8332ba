//! Shared state of a single CLI invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use commission_manager::{
    ActorContext, CommissionDocument, CommissionService, TracingAuditLog, UserId,
};
use serde::Serialize;
use tracing::debug;

use crate::config::{get_config_path, AppConfig};
use crate::errors::Error;
use crate::file_store::FileCommissionRepository;

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Configuration, repository and service for one command.
#[derive(Debug)]
pub struct CommandContext {
    pub config: AppConfig,
    pub repository: Arc<FileCommissionRepository>,
    pub service: CommissionService,
}

impl CommandContext {
    /// Loads the configuration file and opens its data file.
    pub fn load(config_path: Option<&str>) -> Result<Self, Error> {
        let path = get_config_path(config_path);
        let config = AppConfig::load(&path)?;
        let data_path = config.data_path(&path);
        Ok(Self::from_config(config, data_path))
    }

    pub fn from_config(config: AppConfig, data_path: PathBuf) -> Self {
        debug!(message = "Opening commission data", path = ?data_path);
        let repository = Arc::new(FileCommissionRepository::new(data_path));
        let service = CommissionService::from_settings(
            repository.clone(),
            Arc::new(TracingAuditLog),
            &config.engine,
        );

        Self {
            config,
            repository,
            service,
        }
    }

    pub fn actor(&self) -> ActorContext {
        self.config.actor()
    }
}

/// Validates a user id given on the command line.
pub fn parse_user_id(value: i64) -> Result<UserId, Error> {
    if value <= 0 {
        return Err(Error::InvalidArguments(format!(
            "user id must be a positive number, got {}",
            value
        )));
    }
    Ok(UserId::new(value))
}

/// Reads a commission document from a JSON file.
///
/// Malformed JSON is reported as a `CommissionError::Validation`.
pub fn read_document(path: &Path) -> Result<CommissionDocument, Error> {
    let content = fs::read_to_string(path).map_err(Error::LoadFile)?;
    Ok(CommissionDocument::from_json_str(&content)?)
}

/// Renders a value as pretty-printed JSON.
pub fn render_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Output(e.to_string()))
}
