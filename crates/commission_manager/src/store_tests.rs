//! Tests for the cached configuration store.

use super::*;
use crate::cache::{CacheTicket, InMemoryCommissionCache};
use crate::errors::CommissionError;
use crate::repository::{InMemoryCommissionRepository, UserIdentity};
use crate::types::{Asset, Leaf};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// Mock Collaborators
// ============================================================================

/// Repository that counts loads and delegates to an in-memory repository.
struct CountingRepository {
    inner: InMemoryCommissionRepository,
    global_loads: AtomicUsize,
    override_loads: AtomicUsize,
}

impl CountingRepository {
    fn new(inner: InMemoryCommissionRepository) -> Self {
        Self {
            inner,
            global_loads: AtomicUsize::new(0),
            override_loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CommissionRepository for CountingRepository {
    async fn load_global(&self) -> CommissionResult<Option<CommissionSet>> {
        self.global_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_global().await
    }

    async fn save_global(&self, global: &CommissionSet) -> CommissionResult<()> {
        self.inner.save_global(global).await
    }

    async fn load_override(&self, user_id: UserId) -> CommissionResult<Option<CommissionSet>> {
        self.override_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_override(user_id).await
    }

    async fn save_override(
        &self,
        user_id: UserId,
        overrides: &CommissionSet,
    ) -> CommissionResult<()> {
        self.inner.save_override(user_id, overrides).await
    }

    async fn list_customized_overrides(&self) -> CommissionResult<Vec<(UserIdentity, CommissionSet)>> {
        self.inner.list_customized_overrides().await
    }

    async fn find_user(&self, user_id: UserId) -> CommissionResult<Option<UserIdentity>> {
        self.inner.find_user(user_id).await
    }

    async fn has_user_settings(&self, user_id: UserId) -> CommissionResult<bool> {
        self.inner.has_user_settings(user_id).await
    }

    async fn commit_global_change(
        &self,
        global: &CommissionSet,
        overrides: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()> {
        self.inner.commit_global_change(global, overrides).await
    }
}

/// Repository whose first global load races a concurrent write: while the
/// stale value is in flight the write lands and invalidates the cache.
struct RacingRepository {
    inner: InMemoryCommissionRepository,
    cache: Arc<InMemoryCommissionCache>,
    fresh: CommissionSet,
    loads: AtomicUsize,
}

#[async_trait]
impl CommissionRepository for RacingRepository {
    async fn load_global(&self) -> CommissionResult<Option<CommissionSet>> {
        let stale = self.inner.load_global().await?;
        if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.save_global(&self.fresh).await?;
            self.cache.invalidate(&CacheKey::Global).await?;
        }
        Ok(stale)
    }

    async fn save_global(&self, global: &CommissionSet) -> CommissionResult<()> {
        self.inner.save_global(global).await
    }

    async fn load_override(&self, user_id: UserId) -> CommissionResult<Option<CommissionSet>> {
        self.inner.load_override(user_id).await
    }

    async fn save_override(
        &self,
        user_id: UserId,
        overrides: &CommissionSet,
    ) -> CommissionResult<()> {
        self.inner.save_override(user_id, overrides).await
    }

    async fn list_customized_overrides(&self) -> CommissionResult<Vec<(UserIdentity, CommissionSet)>> {
        self.inner.list_customized_overrides().await
    }

    async fn find_user(&self, user_id: UserId) -> CommissionResult<Option<UserIdentity>> {
        self.inner.find_user(user_id).await
    }

    async fn has_user_settings(&self, user_id: UserId) -> CommissionResult<bool> {
        self.inner.has_user_settings(user_id).await
    }

    async fn commit_global_change(
        &self,
        global: &CommissionSet,
        overrides: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()> {
        self.inner.commit_global_change(global, overrides).await
    }
}

/// Cache where every operation fails.
struct BrokenCache;

fn broken() -> CommissionError {
    CommissionError::Cache {
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl CommissionCache for BrokenCache {
    async fn get(&self, _key: &CacheKey) -> CommissionResult<Option<CommissionSet>> {
        Err(broken())
    }

    async fn ticket(&self, _key: &CacheKey) -> CommissionResult<CacheTicket> {
        Err(broken())
    }

    async fn insert(
        &self,
        _key: &CacheKey,
        _ticket: CacheTicket,
        _value: CommissionSet,
    ) -> CommissionResult<bool> {
        Err(broken())
    }

    async fn invalidate(&self, _key: &CacheKey) -> CommissionResult<()> {
        Err(broken())
    }
}

/// In-memory cache whose invalidations can be made to fail.
struct FlakyInvalidationCache {
    inner: InMemoryCommissionCache,
    fail_invalidate: AtomicBool,
}

impl FlakyInvalidationCache {
    fn new() -> Self {
        Self {
            inner: InMemoryCommissionCache::new(Duration::from_secs(3600)),
            fail_invalidate: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CommissionCache for FlakyInvalidationCache {
    async fn get(&self, key: &CacheKey) -> CommissionResult<Option<CommissionSet>> {
        self.inner.get(key).await
    }

    async fn ticket(&self, key: &CacheKey) -> CommissionResult<CacheTicket> {
        self.inner.ticket(key).await
    }

    async fn insert(
        &self,
        key: &CacheKey,
        ticket: CacheTicket,
        value: CommissionSet,
    ) -> CommissionResult<bool> {
        self.inner.insert(key, ticket, value).await
    }

    async fn invalidate(&self, key: &CacheKey) -> CommissionResult<()> {
        if self.fail_invalidate.load(Ordering::SeqCst) {
            return Err(broken());
        }
        self.inner.invalidate(key).await
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

const USER: UserId = UserId::new(1);

fn usd(value: Decimal) -> CommissionSet {
    CommissionSet::new().with(Leaf::Transfer(Asset::Usd), value)
}

async fn seeded_repository() -> InMemoryCommissionRepository {
    let repository = InMemoryCommissionRepository::new();
    repository
        .add_user(UserIdentity::new(USER, "a@example.com"))
        .await;
    repository
}

fn cache() -> Arc<InMemoryCommissionCache> {
    Arc::new(InMemoryCommissionCache::new(Duration::from_secs(3600)))
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_get_global_reads_through_once() {
    let inner = seeded_repository().await;
    inner.save_global(&usd(dec!(1))).await.unwrap();
    let repository = Arc::new(CountingRepository::new(inner));
    let store = CachedConfigStore::new(repository.clone(), cache());

    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(1))));
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(1))));

    assert_eq!(repository.global_loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_global_absent_is_not_cached() {
    let repository = Arc::new(CountingRepository::new(seeded_repository().await));
    let store = CachedConfigStore::new(repository.clone(), cache());

    assert_eq!(store.get_global().await.unwrap(), None);
    assert_eq!(store.get_global().await.unwrap(), None);

    assert_eq!(repository.global_loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_get_user_override_is_scoped_by_user() {
    let inner = seeded_repository().await;
    inner
        .add_user(UserIdentity::new(UserId::new(2), "b@example.com"))
        .await;
    inner.save_override(USER, &usd(dec!(5))).await.unwrap();
    let store = CachedConfigStore::new(Arc::new(inner), cache());

    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(5))));
    assert_eq!(store.get_user_override(UserId::new(2)).await.unwrap(), None);
}

#[tokio::test]
async fn test_cache_failure_falls_back_to_persistence() {
    let inner = seeded_repository().await;
    inner.save_global(&usd(dec!(1))).await.unwrap();
    inner.save_override(USER, &usd(dec!(5))).await.unwrap();
    let store = CachedConfigStore::new(Arc::new(inner), Arc::new(BrokenCache));

    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(1))));
    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(5))));
}

#[tokio::test]
async fn test_cache_failure_does_not_fail_writes() {
    let store = CachedConfigStore::new(Arc::new(seeded_repository().await), Arc::new(BrokenCache));

    store.set_global(&usd(dec!(2))).await.unwrap();
    store.set_user_override(USER, &usd(dec!(3))).await.unwrap();

    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(2))));
    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(3))));
}

#[tokio::test]
async fn test_persistence_failure_on_read_propagates() {
    struct FailingLoad;

    #[async_trait]
    impl CommissionRepository for FailingLoad {
        async fn load_global(&self) -> CommissionResult<Option<CommissionSet>> {
            Err(CommissionError::persistence("load_global", "database unavailable"))
        }
        async fn save_global(&self, _global: &CommissionSet) -> CommissionResult<()> {
            Ok(())
        }
        async fn load_override(&self, _user_id: UserId) -> CommissionResult<Option<CommissionSet>> {
            Ok(None)
        }
        async fn save_override(&self, _user_id: UserId, _o: &CommissionSet) -> CommissionResult<()> {
            Ok(())
        }
        async fn list_customized_overrides(
            &self,
        ) -> CommissionResult<Vec<(UserIdentity, CommissionSet)>> {
            Ok(Vec::new())
        }
        async fn find_user(&self, _user_id: UserId) -> CommissionResult<Option<UserIdentity>> {
            Ok(None)
        }
        async fn has_user_settings(&self, _user_id: UserId) -> CommissionResult<bool> {
            Ok(false)
        }
        async fn commit_global_change(
            &self,
            _global: &CommissionSet,
            _overrides: &[(UserId, CommissionSet)],
        ) -> CommissionResult<()> {
            Ok(())
        }
    }

    let store = CachedConfigStore::new(Arc::new(FailingLoad), cache());

    match store.get_global().await {
        Err(CommissionError::Persistence { operation, .. }) => assert_eq!(operation, "load_global"),
        other => panic!("Expected Persistence error, got {:?}", other),
    }
}

// ============================================================================
// Writes and invalidation
// ============================================================================

#[tokio::test]
async fn test_set_global_invalidates_cached_value() {
    let store = CachedConfigStore::new(Arc::new(seeded_repository().await), cache());

    store.set_global(&usd(dec!(1))).await.unwrap();
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(1))));

    store.set_global(&usd(dec!(2))).await.unwrap();
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(2))));
}

#[tokio::test]
async fn test_set_global_leaves_user_entries_cached() {
    let inner = seeded_repository().await;
    inner.save_override(USER, &usd(dec!(5))).await.unwrap();
    let repository = Arc::new(CountingRepository::new(inner));
    let store = CachedConfigStore::new(repository.clone(), cache());

    store.get_user_override(USER).await.unwrap();
    store.set_global(&usd(dec!(2))).await.unwrap();
    store.get_user_override(USER).await.unwrap();

    assert_eq!(repository.override_loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_set_user_override_invalidates_cached_value() {
    let store = CachedConfigStore::new(Arc::new(seeded_repository().await), cache());

    store.set_user_override(USER, &usd(dec!(5))).await.unwrap();
    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(5))));

    store.set_user_override(USER, &usd(dec!(6))).await.unwrap();
    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(6))));
}

#[tokio::test]
async fn test_reset_user_override_clears_value() {
    let store = CachedConfigStore::new(Arc::new(seeded_repository().await), cache());

    store.set_user_override(USER, &usd(dec!(5))).await.unwrap();
    store.get_user_override(USER).await.unwrap();
    store.reset_user_override(USER).await.unwrap();

    assert_eq!(store.get_user_override(USER).await.unwrap(), None);
}

#[tokio::test]
async fn test_set_user_override_without_settings_fails() {
    let store = CachedConfigStore::new(Arc::new(InMemoryCommissionRepository::new()), cache());

    let result = store.set_user_override(USER, &usd(dec!(5))).await;

    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_commit_global_change_invalidates_every_key() {
    let store = CachedConfigStore::new(Arc::new(seeded_repository().await), cache());
    store.set_global(&usd(dec!(1))).await.unwrap();
    store.set_user_override(USER, &usd(dec!(1))).await.unwrap();
    store.get_global().await.unwrap();
    store.get_user_override(USER).await.unwrap();

    store
        .commit_global_change(&usd(dec!(2)), &[(USER, usd(dec!(2)))])
        .await
        .unwrap();

    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(2))));
    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(2))));
}

#[tokio::test]
async fn test_racing_reader_cannot_cache_stale_value() {
    let cache = cache();
    let inner = seeded_repository().await;
    inner.save_global(&usd(dec!(1))).await.unwrap();
    let repository = Arc::new(RacingRepository {
        inner,
        cache: cache.clone(),
        fresh: usd(dec!(2)),
        loads: AtomicUsize::new(0),
    });
    let store = CachedConfigStore::new(repository.clone(), cache.clone());

    // The in-flight read still returns what it loaded
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(1))));

    // but the stale value never reached the cache
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(2))));
    assert_eq!(repository.loads.load(Ordering::SeqCst), 2);
    assert_eq!(cache.cache_statistics().unwrap().rejected_inserts, 1);
}

#[tokio::test]
async fn test_failed_invalidation_never_serves_stale_value() {
    let cache = Arc::new(FlakyInvalidationCache::new());
    let store = CachedConfigStore::new(Arc::new(seeded_repository().await), cache.clone());
    store.set_global(&usd(dec!(0.5))).await.unwrap();
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(0.5))));

    cache.fail_invalidate.store(true, Ordering::SeqCst);
    store.set_global(&usd(dec!(0.9))).await.unwrap();

    // The old entry is still in the cache but is bypassed
    assert_eq!(cache.inner.get(&CacheKey::Global).await.unwrap(), Some(usd(dec!(0.5))));
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(0.9))));
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(0.9))));
}

#[tokio::test]
async fn test_failed_user_invalidation_is_scoped_to_that_key() {
    let cache = Arc::new(FlakyInvalidationCache::new());
    let inner = seeded_repository().await;
    inner.save_global(&usd(dec!(1))).await.unwrap();
    let repository = Arc::new(CountingRepository::new(inner));
    let store = CachedConfigStore::new(repository.clone(), cache.clone());
    store.set_user_override(USER, &usd(dec!(5))).await.unwrap();
    store.get_user_override(USER).await.unwrap();
    store.get_global().await.unwrap();

    cache.fail_invalidate.store(true, Ordering::SeqCst);
    store.set_user_override(USER, &usd(dec!(6))).await.unwrap();

    assert_eq!(store.get_user_override(USER).await.unwrap(), Some(usd(dec!(6))));
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(1))));
    assert_eq!(repository.global_loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_is_trusted_again_once_invalidation_succeeds() {
    let cache = Arc::new(FlakyInvalidationCache::new());
    let repository = Arc::new(CountingRepository::new(seeded_repository().await));
    let store = CachedConfigStore::new(repository.clone(), cache.clone());
    store.set_global(&usd(dec!(1))).await.unwrap();
    store.get_global().await.unwrap();

    cache.fail_invalidate.store(true, Ordering::SeqCst);
    store.set_global(&usd(dec!(2))).await.unwrap();
    store.get_global().await.unwrap();
    assert_eq!(repository.global_loads.load(Ordering::SeqCst), 2);

    cache.fail_invalidate.store(false, Ordering::SeqCst);

    // The retried invalidation clears the stale entry, then reads cache again
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(2))));
    assert_eq!(store.get_global().await.unwrap(), Some(usd(dec!(2))));
    assert_eq!(repository.global_loads.load(Ordering::SeqCst), 3);
}
