//! Commission engine error types.
//!
//! Domain-specific errors for validating commission documents, resolving
//! users, and talking to the persistence, cache and audit collaborators.

use thiserror::Error;

use crate::types::UserId;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Commission engine errors.
///
/// `Cache` and `Audit` errors are produced by the collaborator ports. The
/// configuration store and the service treat them as non-fatal, so callers of
/// the public operations normally only observe the other variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommissionError {
    #[error("Invalid commission data: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: UserId },

    #[error("User settings not found for user {user_id}")]
    UserSettingsNotFound { user_id: UserId },

    #[error("Persistence operation '{operation}' failed: {reason}")]
    Persistence { operation: String, reason: String },

    #[error("Commission cache failure: {reason}")]
    Cache { reason: String },

    #[error("Audit log failure: {reason}")]
    Audit { reason: String },
}

impl CommissionError {
    /// Shorthand for a validation failure on a single field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a failed repository call.
    pub fn persistence(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Persistence {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for the "not found" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::UserSettingsNotFound { .. }
        )
    }
}

/// Result type alias for commission engine operations.
pub type CommissionResult<T> = Result<T, CommissionError>;
