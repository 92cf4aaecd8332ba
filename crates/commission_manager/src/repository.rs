//! Persistence port for commission configuration.
//!
//! The engine never talks to a database directly. It goes through the
//! [`CommissionRepository`] trait, whose adapters own the storage mechanics.
//! The only transactional requirement is
//! [`CommissionRepository::commit_global_change`], which must store the new
//! global configuration and every reconciled override all-or-nothing.
//!
//! [`CommissionSnapshot`] is the plain data model shared by the adapters in
//! this workspace. [`InMemoryCommissionRepository`] keeps one behind a lock;
//! file-backed adapters serialize it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{CommissionError, CommissionResult};
use crate::types::{CommissionSet, UserId};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// A platform user as seen by the commission engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: UserId,
    pub email: String,
}

impl UserIdentity {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// Storage operations required by the commission engine.
///
/// An override is stored on the user's settings record. Saving an empty
/// [`CommissionSet`] clears the override; it does not remove the record.
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Loads the global configuration, `None` if it was never written.
    async fn load_global(&self) -> CommissionResult<Option<CommissionSet>>;

    async fn save_global(&self, global: &CommissionSet) -> CommissionResult<()>;

    /// Loads the stored override of a user.
    ///
    /// Returns `None` when the user has no settings record or when the
    /// stored override is empty.
    async fn load_override(&self, user_id: UserId) -> CommissionResult<Option<CommissionSet>>;

    /// Replaces the override of a user.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::UserSettingsNotFound` when the user has no
    /// settings record.
    async fn save_override(&self, user_id: UserId, overrides: &CommissionSet)
        -> CommissionResult<()>;

    /// Every user with a non-empty override, ordered by user id.
    async fn list_customized_overrides(&self) -> CommissionResult<Vec<(UserIdentity, CommissionSet)>>;

    async fn find_user(&self, user_id: UserId) -> CommissionResult<Option<UserIdentity>>;

    async fn has_user_settings(&self, user_id: UserId) -> CommissionResult<bool>;

    /// Stores a new global configuration together with reconciled overrides.
    ///
    /// Either every write is applied or none is.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Persistence` (or `UserSettingsNotFound` for a
    /// vanished settings record) and leaves the stored state untouched.
    async fn commit_global_change(
        &self,
        global: &CommissionSet,
        overrides: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()>;
}

/// Per-user settings record holding the commission override.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub commissions: CommissionSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,

    /// `None` when the user has no settings record yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<UserSettings>,
}

/// Complete persisted state of the commission engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommissionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<CommissionSet>,

    #[serde(default)]
    pub users: BTreeMap<UserId, UserRecord>,
}

impl CommissionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user, optionally with an empty settings record.
    ///
    /// An existing record for the same id is replaced.
    pub fn add_user(&mut self, identity: UserIdentity, with_settings: bool) {
        self.users.insert(
            identity.user_id,
            UserRecord {
                email: identity.email,
                settings: with_settings.then(UserSettings::default),
            },
        );
    }

    pub fn identity(&self, user_id: UserId) -> Option<UserIdentity> {
        self.users
            .get(&user_id)
            .map(|record| UserIdentity::new(user_id, record.email.clone()))
    }

    pub fn has_settings(&self, user_id: UserId) -> bool {
        self.users
            .get(&user_id)
            .is_some_and(|record| record.settings.is_some())
    }

    /// Stored override of a user, `None` when missing or empty.
    pub fn override_of(&self, user_id: UserId) -> Option<&CommissionSet> {
        self.users
            .get(&user_id)
            .and_then(|record| record.settings.as_ref())
            .map(|settings| &settings.commissions)
            .filter(|commissions| !commissions.is_empty())
    }

    pub fn set_override(&mut self, user_id: UserId, overrides: CommissionSet) -> CommissionResult<()> {
        match self
            .users
            .get_mut(&user_id)
            .and_then(|record| record.settings.as_mut())
        {
            Some(settings) => {
                settings.commissions = overrides;
                Ok(())
            }
            None => Err(CommissionError::UserSettingsNotFound { user_id }),
        }
    }

    pub fn customized(&self) -> Vec<(UserIdentity, CommissionSet)> {
        self.users
            .keys()
            .filter_map(|user_id| {
                let overrides = self.override_of(*user_id)?.clone();
                let identity = self.identity(*user_id)?;
                Some((identity, overrides))
            })
            .collect()
    }

    /// Applies a global change with its reconciled overrides.
    ///
    /// Every target is checked before anything is written, so a failure
    /// leaves the snapshot unchanged.
    pub fn apply_global_change(
        &mut self,
        global: &CommissionSet,
        overrides: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()> {
        if let Some((user_id, _)) = overrides.iter().find(|(id, _)| !self.has_settings(*id)) {
            return Err(CommissionError::UserSettingsNotFound { user_id: *user_id });
        }

        self.global = Some(global.clone());
        for (user_id, set) in overrides {
            self.set_override(*user_id, set.clone())?;
        }
        Ok(())
    }
}

/// Thread-safe in-memory repository.
///
/// Suitable for tests and single-instance deployments. Data is lost when the
/// process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommissionRepository {
    state: Arc<RwLock<CommissionSnapshot>>,
}

impl InMemoryCommissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CommissionSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> CommissionSnapshot {
        self.state.read().await.clone()
    }

    /// Registers a user with an empty settings record.
    pub async fn add_user(&self, identity: UserIdentity) {
        self.state.write().await.add_user(identity, true);
    }

    /// Registers a user that has no settings record.
    pub async fn add_user_without_settings(&self, identity: UserIdentity) {
        self.state.write().await.add_user(identity, false);
    }
}

#[async_trait]
impl CommissionRepository for InMemoryCommissionRepository {
    async fn load_global(&self) -> CommissionResult<Option<CommissionSet>> {
        Ok(self.state.read().await.global.clone())
    }

    async fn save_global(&self, global: &CommissionSet) -> CommissionResult<()> {
        self.state.write().await.global = Some(global.clone());
        Ok(())
    }

    async fn load_override(&self, user_id: UserId) -> CommissionResult<Option<CommissionSet>> {
        Ok(self.state.read().await.override_of(user_id).cloned())
    }

    async fn save_override(
        &self,
        user_id: UserId,
        overrides: &CommissionSet,
    ) -> CommissionResult<()> {
        self.state
            .write()
            .await
            .set_override(user_id, overrides.clone())
    }

    async fn list_customized_overrides(&self) -> CommissionResult<Vec<(UserIdentity, CommissionSet)>> {
        Ok(self.state.read().await.customized())
    }

    async fn find_user(&self, user_id: UserId) -> CommissionResult<Option<UserIdentity>> {
        Ok(self.state.read().await.identity(user_id))
    }

    async fn has_user_settings(&self, user_id: UserId) -> CommissionResult<bool> {
        Ok(self.state.read().await.has_settings(user_id))
    }

    async fn commit_global_change(
        &self,
        global: &CommissionSet,
        overrides: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()> {
        let mut state = self.state.write().await;
        state.apply_global_change(global, overrides)?;
        debug!(
            message = "Committed global commission change",
            overrides = overrides.len()
        );
        Ok(())
    }
}
