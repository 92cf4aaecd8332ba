//! Cached configuration store.
//!
//! Read-through access to the global configuration and the per-user overrides
//! with delete-on-write invalidation. The store is the only component that
//! touches the cache.
//!
//! Cache failures never fail a call. Reads fall back to persistence and skip
//! caching. A key whose invalidation failed may still hold a stale entry, so
//! it is read from persistence until an invalidation of it succeeds; every
//! read of such a key retries the invalidation first.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument, warn};

use crate::cache::{CacheKey, CommissionCache};
use crate::errors::CommissionResult;
use crate::repository::CommissionRepository;
use crate::types::{CommissionSet, UserId};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// Read-through store over a repository and a cache.
///
/// # Examples
///
/// ```rust
/// use commission_manager::{
///     CachedConfigStore, InMemoryCommissionCache, InMemoryCommissionRepository,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> commission_manager::CommissionResult<()> {
/// let store = CachedConfigStore::new(
///     Arc::new(InMemoryCommissionRepository::new()),
///     Arc::new(InMemoryCommissionCache::new(Duration::from_secs(3600))),
/// );
///
/// assert_eq!(store.get_global().await?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CachedConfigStore {
    repository: Arc<dyn CommissionRepository>,
    cache: Arc<dyn CommissionCache>,

    /// Keys whose last invalidation failed.
    untrusted: Arc<Mutex<HashSet<CacheKey>>>,
}

impl std::fmt::Debug for CachedConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedConfigStore")
            .field("repository", &"<CommissionRepository>")
            .field("cache", &"<CommissionCache>")
            .field("untrusted", &self.untrusted)
            .finish()
    }
}

impl CachedConfigStore {
    pub fn new(repository: Arc<dyn CommissionRepository>, cache: Arc<dyn CommissionCache>) -> Self {
        Self {
            repository,
            cache,
            untrusted: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The global configuration, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Persistence` when the value is not cached and
    /// cannot be loaded.
    #[instrument(skip(self))]
    pub async fn get_global(&self) -> CommissionResult<Option<CommissionSet>> {
        self.read_through(CacheKey::Global, || self.repository.load_global())
            .await
    }

    /// The stored override of a user, `None` when absent or empty.
    #[instrument(skip(self))]
    pub async fn get_user_override(&self, user_id: UserId) -> CommissionResult<Option<CommissionSet>> {
        let stored = self
            .read_through(CacheKey::User(user_id), || {
                self.repository.load_override(user_id)
            })
            .await?;
        Ok(stored.filter(|set| !set.is_empty()))
    }

    /// Persists the global configuration and invalidates its cache entry.
    ///
    /// Per-user entries are left alone.
    #[instrument(skip(self, global))]
    pub async fn set_global(&self, global: &CommissionSet) -> CommissionResult<()> {
        self.repository.save_global(global).await?;
        self.invalidate(CacheKey::Global).await;
        Ok(())
    }

    /// Persists a user override and invalidates the user's cache entry.
    #[instrument(skip(self, overrides))]
    pub async fn set_user_override(
        &self,
        user_id: UserId,
        overrides: &CommissionSet,
    ) -> CommissionResult<()> {
        self.repository.save_override(user_id, overrides).await?;
        self.invalidate(CacheKey::User(user_id)).await;
        Ok(())
    }

    /// Clears a user override and invalidates the user's cache entry.
    #[instrument(skip(self))]
    pub async fn reset_user_override(&self, user_id: UserId) -> CommissionResult<()> {
        self.repository
            .save_override(user_id, &CommissionSet::new())
            .await?;
        self.invalidate(CacheKey::User(user_id)).await;
        Ok(())
    }

    /// Persists a global change and its reconciled overrides in one
    /// repository transaction, then invalidates every affected key.
    ///
    /// Nothing is invalidated when the commit fails.
    #[instrument(skip(self, global, reconciled), fields(overrides = reconciled.len()))]
    pub async fn commit_global_change(
        &self,
        global: &CommissionSet,
        reconciled: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()> {
        self.repository
            .commit_global_change(global, reconciled)
            .await?;

        self.invalidate(CacheKey::Global).await;
        for (user_id, _) in reconciled {
            self.invalidate(CacheKey::User(*user_id)).await;
        }
        Ok(())
    }

    async fn read_through<F, Fut>(&self, key: CacheKey, load: F) -> CommissionResult<Option<CommissionSet>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CommissionResult<Option<CommissionSet>>>,
    {
        if self.is_untrusted(&key) && !self.invalidate(key).await {
            debug!(
                message = "Bypassing commission cache until invalidation succeeds",
                key = %key
            );
            return load().await;
        }

        match self.cache.get(&key).await {
            Ok(Some(cached)) => return Ok(Some(cached)),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    message = "Commission cache read failed, reading from persistence",
                    key = %key,
                    error = %e
                );
                return load().await;
            }
        }

        // Taken before the load so a concurrent invalidation wins
        let ticket = match self.cache.ticket(&key).await {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!(message = "Commission cache ticket failed", key = %key, error = %e);
                None
            }
        };

        let loaded = load().await?;

        if let (Some(ticket), Some(value)) = (ticket, loaded.as_ref()) {
            if !value.is_empty() {
                match self.cache.insert(&key, ticket, value.clone()).await {
                    Ok(true) => {}
                    Ok(false) => debug!(message = "Skipped caching stale commission set", key = %key),
                    Err(e) => warn!(message = "Commission cache insert failed", key = %key, error = %e),
                }
            }
        }

        Ok(loaded)
    }

    /// Invalidates `key`, returning `false` when the cache refused.
    async fn invalidate(&self, key: CacheKey) -> bool {
        match self.cache.invalidate(&key).await {
            Ok(()) => {
                self.untrusted_keys().remove(&key);
                true
            }
            Err(e) => {
                warn!(
                    message = "Commission cache invalidation failed, bypassing the entry",
                    key = %key,
                    error = %e
                );
                self.untrusted_keys().insert(key);
                false
            }
        }
    }

    fn is_untrusted(&self, key: &CacheKey) -> bool {
        self.untrusted_keys().contains(key)
    }

    fn untrusted_keys(&self) -> std::sync::MutexGuard<'_, HashSet<CacheKey>> {
        self.untrusted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
