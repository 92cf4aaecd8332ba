use std::io;

use commission_manager::CommissionError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the commission admin CLI.
///
/// Engine failures are wrapped as [`Error::Commission`]; everything else
/// covers the CLI's own configuration, file and output handling.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error occurred while loading or parsing configuration.
    ///
    /// This error is returned when there are issues with the configuration file,
    /// such as a missing file, invalid values, or file access problems.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to load a file from the filesystem.
    ///
    /// Wraps the I/O error raised when reading a commission document.
    #[error("Failed to load file.")]
    LoadFile(io::Error),

    /// The commission engine rejected the operation.
    #[error(transparent)]
    Commission(#[from] CommissionError),

    /// Failed to render command output.
    #[error("Failed to render output: {0}")]
    Output(String),
}

impl Error {
    /// Process exit status for this error: 2 when a user or settings record
    /// does not exist, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Commission(e) if e.is_not_found() => 2,
            _ => 1,
        }
    }
}
