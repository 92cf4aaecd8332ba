//! Commission service.
//!
//! Orchestrates the public commission operations on top of the cached store,
//! the representation mapper and the override merge engine. All inputs and
//! outputs use the external [`CommissionDocument`] shape.
//!
//! # Concurrency
//!
//! A global change holds the exclusive side of a write lock for the whole
//! load, reconcile and commit sequence. Per-user writes hold the shared side,
//! so writes for different users run concurrently but never interleave with a
//! running reconciliation.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::audit::{ActorContext, AuditEvent, AuditLog};
use crate::cache::CommissionCache;
use crate::document::CommissionDocument;
use crate::errors::{CommissionError, CommissionResult};
use crate::mapper::{to_external, to_internal};
use crate::merger::OverrideMerger;
use crate::repository::{CommissionRepository, UserIdentity};
use crate::settings::CommissionSettings;
use crate::store::CachedConfigStore;
use crate::types::{CommissionSet, UserId};

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

/// Result of looking up the stored override of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommissionLookup {
    /// No such user exists.
    UserNotFound,

    /// The user exists but has no override; global commissions apply.
    NotCustomized,

    /// The stored override. Fields that are not customized are absent.
    Customized(CommissionDocument),
}

/// A user with a non-empty override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomizedUser {
    #[serde(flatten)]
    pub user: UserIdentity,
    pub commissions: CommissionDocument,
}

/// Outcome of a global commission change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GlobalChangeSummary {
    /// Customized users whose override was reconciled.
    pub users_reconciled: usize,

    /// Users whose override took at least one new global value.
    pub users_updated: usize,

    /// Total number of override leaves that took a new global value.
    pub leaves_refreshed: usize,
}

/// Entry point for reading and changing commissions.
///
/// # Examples
///
/// ```rust
/// use commission_manager::{
///     CommissionService, CommissionSettings, InMemoryCommissionRepository, TracingAuditLog,
/// };
/// use std::sync::Arc;
///
/// # async fn example() -> commission_manager::CommissionResult<()> {
/// let service = CommissionService::from_settings(
///     Arc::new(InMemoryCommissionRepository::new()),
///     Arc::new(TracingAuditLog),
///     &CommissionSettings::default(),
/// );
///
/// // Nothing configured yet
/// assert_eq!(service.get_global().await?, None);
/// # Ok(())
/// # }
/// ```
pub struct CommissionService {
    repository: Arc<dyn CommissionRepository>,
    store: CachedConfigStore,
    audit: Arc<dyn AuditLog>,
    merger: OverrideMerger,
    write_lock: RwLock<()>,
}

impl std::fmt::Debug for CommissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommissionService")
            .field("store", &self.store)
            .field("audit", &"<AuditLog>")
            .finish()
    }
}

impl CommissionService {
    pub fn new(
        repository: Arc<dyn CommissionRepository>,
        cache: Arc<dyn CommissionCache>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            store: CachedConfigStore::new(repository.clone(), cache),
            repository,
            audit,
            merger: OverrideMerger::new(),
            write_lock: RwLock::new(()),
        }
    }

    /// Creates a service whose cache is built from `settings`.
    pub fn from_settings(
        repository: Arc<dyn CommissionRepository>,
        audit: Arc<dyn AuditLog>,
        settings: &CommissionSettings,
    ) -> Self {
        Self::new(repository, settings.build_cache(), audit)
    }

    /// The global commissions, `None` when none were ever configured.
    #[instrument(skip(self))]
    pub async fn get_global(&self) -> CommissionResult<Option<CommissionDocument>> {
        let global = self.store.get_global().await?;
        Ok(global.as_ref().and_then(to_external))
    }

    /// Replaces the global commissions and reconciles every user override.
    ///
    /// Each customized user's override is reconciled leaf by leaf: values
    /// that still matched the old global value follow the new one, all other
    /// values are kept. The new global configuration and every changed
    /// override are persisted in a single transaction.
    ///
    /// # Errors
    ///
    /// - `CommissionError::Validation` when `document` is incomplete or an
    ///   exchange rate is out of range. Nothing is written.
    /// - `CommissionError::Persistence` when loading the current state or
    ///   committing the change fails. Nothing is applied.
    #[instrument(skip(self, document), fields(actor_id = %actor.actor_id))]
    pub async fn set_global(
        &self,
        actor: &ActorContext,
        document: &CommissionDocument,
    ) -> CommissionResult<GlobalChangeSummary> {
        document.validate()?;
        let new_global = to_internal(document);

        let summary = {
            let _guard = self.write_lock.write().await;

            let old_global = self.repository.load_global().await?;
            let customized = self.repository.list_customized_overrides().await?;
            debug!(
                message = "Reconciling user overrides",
                users = customized.len(),
                first_global = old_global.is_none()
            );

            let mut summary = GlobalChangeSummary {
                users_reconciled: customized.len(),
                ..Default::default()
            };
            let mut changed: Vec<(UserId, CommissionSet)> = Vec::new();

            for (identity, stored) in &customized {
                let result = self
                    .merger
                    .reconcile(old_global.as_ref(), &new_global, stored);
                if result.is_changed() {
                    debug!(
                        message = "Override follows global change",
                        user_id = %identity.user_id,
                        refreshed = result.refreshed.len(),
                        preserved = result.preserved.len()
                    );
                    summary.users_updated += 1;
                    summary.leaves_refreshed += result.refreshed.len();
                    changed.push((identity.user_id, result.updated));
                }
            }

            self.store
                .commit_global_change(&new_global, &changed)
                .await
                .map_err(|e| match e {
                    CommissionError::Persistence { .. } => e,
                    other => CommissionError::persistence("commit_global_change", other.to_string()),
                })?;

            summary
        };

        info!(
            message = "Global commissions changed",
            users_reconciled = summary.users_reconciled,
            users_updated = summary.users_updated,
            leaves_refreshed = summary.leaves_refreshed
        );

        self.record_audit(AuditEvent::global_commissions_changed(actor))
            .await;

        Ok(summary)
    }

    /// The stored override of a user, without global values filled in.
    #[instrument(skip(self))]
    pub async fn get_user_override(&self, user_id: UserId) -> CommissionResult<UserCommissionLookup> {
        if self.repository.find_user(user_id).await?.is_none() {
            debug!(message = "User not found", user_id = %user_id);
            return Ok(UserCommissionLookup::UserNotFound);
        }

        let stored = self.store.get_user_override(user_id).await?;
        Ok(match stored.as_ref().and_then(to_external) {
            Some(document) => UserCommissionLookup::Customized(document),
            None => UserCommissionLookup::NotCustomized,
        })
    }

    /// The user's override when one exists, otherwise exactly
    /// [`CommissionService::get_global`].
    #[instrument(skip(self))]
    pub async fn get_user_override_or_global(
        &self,
        user_id: UserId,
    ) -> CommissionResult<Option<CommissionDocument>> {
        if let Some(stored) = self.store.get_user_override(user_id).await? {
            if let Some(document) = to_external(&stored) {
                return Ok(Some(document));
            }
        }
        self.get_global().await
    }

    /// Replaces the override of a user.
    ///
    /// # Errors
    ///
    /// - `CommissionError::Validation` for an invalid document.
    /// - `CommissionError::UserSettingsNotFound` when the user has no settings
    ///   record.
    /// - `CommissionError::UserNotFound` when the user does not exist.
    #[instrument(skip(self, document), fields(actor_id = %actor.actor_id))]
    pub async fn set_user_override(
        &self,
        actor: &ActorContext,
        user_id: UserId,
        document: &CommissionDocument,
    ) -> CommissionResult<()> {
        document.validate()?;
        let overrides = to_internal(document);

        let subject = {
            let _guard = self.write_lock.read().await;
            let subject = self.require_settings(user_id).await?;
            self.store.set_user_override(user_id, &overrides).await?;
            subject
        };

        info!(message = "User commissions changed", user_id = %user_id);
        self.record_audit(AuditEvent::user_commissions_changed(actor, subject))
            .await;
        Ok(())
    }

    /// Every user with a non-empty override, ordered by user id.
    #[instrument(skip(self))]
    pub async fn list_customized_users(&self) -> CommissionResult<Vec<CustomizedUser>> {
        let customized = self.repository.list_customized_overrides().await?;
        Ok(customized
            .into_iter()
            .filter_map(|(user, stored)| {
                to_external(&stored).map(|commissions| CustomizedUser { user, commissions })
            })
            .collect())
    }

    /// Removes every customization of a user.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::UserSettingsNotFound` when the user has no
    /// settings record.
    #[instrument(skip(self), fields(actor_id = %actor.actor_id))]
    pub async fn reset_user_override(
        &self,
        actor: &ActorContext,
        user_id: UserId,
    ) -> CommissionResult<()> {
        let subject = {
            let _guard = self.write_lock.read().await;
            let subject = self.require_settings(user_id).await?;
            self.store.reset_user_override(user_id).await?;
            subject
        };

        info!(message = "User commissions reset", user_id = %user_id);
        self.record_audit(AuditEvent::user_commissions_reset(actor, subject))
            .await;
        Ok(())
    }

    /// Commissions that actually apply to a user: the override with every
    /// absent field taken from the global configuration.
    ///
    /// Returns `None` when neither the user nor the platform has any
    /// commissions configured.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::UserNotFound` for an unknown user.
    #[instrument(skip(self))]
    pub async fn effective_user_commissions(
        &self,
        user_id: UserId,
    ) -> CommissionResult<Option<CommissionDocument>> {
        if self.repository.find_user(user_id).await?.is_none() {
            return Err(CommissionError::UserNotFound { user_id });
        }

        let global = self.store.get_global().await?.unwrap_or_default();
        let effective = match self.store.get_user_override(user_id).await? {
            Some(stored) => stored.resolve(&global),
            None => global,
        };
        Ok(to_external(&effective))
    }

    async fn require_settings(&self, user_id: UserId) -> CommissionResult<UserIdentity> {
        if !self.repository.has_user_settings(user_id).await? {
            return Err(CommissionError::UserSettingsNotFound { user_id });
        }
        self.repository
            .find_user(user_id)
            .await?
            .ok_or(CommissionError::UserNotFound { user_id })
    }

    async fn record_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(&event).await {
            warn!(
                message = "Failed to record audit event",
                action = %event.action,
                event_id = %event.id,
                error = %e
            );
        }
    }
}
