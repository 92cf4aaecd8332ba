//! Audit trail for commission changes.
//!
//! Every mutating service call receives the acting operator as an explicit
//! [`ActorContext`] and records one [`AuditEvent`] after the change has been
//! committed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

use crate::errors::CommissionResult;
use crate::repository::UserIdentity;
use crate::types::UserId;

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;

/// The operator performing a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: UserId,
    pub actor_email: String,
}

impl ActorContext {
    pub fn new(actor_id: UserId, actor_email: impl Into<String>) -> Self {
        Self {
            actor_id,
            actor_email: actor_email.into(),
        }
    }
}

/// Kind of audited change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    GlobalCommissionsChanged,
    UserCommissionsChanged,
    UserCommissionsReset,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::GlobalCommissionsChanged => "global_commissions_changed",
            AuditAction::UserCommissionsChanged => "user_commissions_changed",
            AuditAction::UserCommissionsReset => "user_commissions_reset",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: ActorContext,
    pub action: AuditAction,
    pub description: String,

    /// The user whose commissions changed, `None` for global changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<UserIdentity>,
}

impl AuditEvent {
    fn new(
        actor: &ActorContext,
        action: AuditAction,
        description: String,
        subject: Option<UserIdentity>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor: actor.clone(),
            action,
            description,
            subject,
        }
    }

    pub fn global_commissions_changed(actor: &ActorContext) -> Self {
        Self::new(
            actor,
            AuditAction::GlobalCommissionsChanged,
            "Global commissions were changed".to_string(),
            None,
        )
    }

    pub fn user_commissions_changed(actor: &ActorContext, subject: UserIdentity) -> Self {
        let description = format!("Commissions of user {} were changed", subject.email);
        Self::new(
            actor,
            AuditAction::UserCommissionsChanged,
            description,
            Some(subject),
        )
    }

    pub fn user_commissions_reset(actor: &ActorContext, subject: UserIdentity) -> Self {
        let description = format!("Commissions of user {} were reset", subject.email);
        Self::new(
            actor,
            AuditAction::UserCommissionsReset,
            description,
            Some(subject),
        )
    }
}

/// Sink for audit events.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Records an event.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Audit` when the event cannot be stored.
    async fn record(&self, event: &AuditEvent) -> CommissionResult<()>;
}

/// Audit log that emits events through `tracing` on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, event: &AuditEvent) -> CommissionResult<()> {
        info!(
            target: "audit",
            event_id = %event.id,
            timestamp = %event.timestamp,
            actor_id = %event.actor.actor_id,
            actor_email = %event.actor.actor_email,
            action = %event.action,
            subject_id = ?event.subject.as_ref().map(|s| s.user_id.value()),
            "{}",
            event.description
        );
        Ok(())
    }
}
