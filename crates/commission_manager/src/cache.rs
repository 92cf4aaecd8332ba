//! Cache port and the in-memory cache.
//!
//! Commission sets are cached under two kinds of keys: `commissions` for the
//! global configuration and `commissions_{user_id}` for a user override.
//! Writes never update a cached value; they delete it and let the next read
//! load it again.
//!
//! # Generation Tickets
//!
//! A reader asks for a [`CacheTicket`] before loading from persistence and
//! hands it back on insert. Every invalidation of a key bumps its generation,
//! so an insert carrying an older ticket is rejected and a value read before a
//! concurrent write can never land in the cache after it.
//!
//! # Examples
//!
//! ```rust
//! use commission_manager::{CacheKey, CommissionCache, CommissionSet, InMemoryCommissionCache};
//! use std::time::Duration;
//!
//! # async fn example() -> commission_manager::CommissionResult<()> {
//! let cache = InMemoryCommissionCache::new(Duration::from_secs(60));
//!
//! let ticket = cache.ticket(&CacheKey::Global).await?;
//! cache.invalidate(&CacheKey::Global).await?;
//!
//! // The ticket predates the invalidation and is refused
//! let stored = cache.insert(&CacheKey::Global, ticket, CommissionSet::new()).await?;
//! assert!(!stored);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::errors::{CommissionError, CommissionResult};
use crate::types::{CommissionSet, UserId};

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

/// Key of a cached commission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Global,
    User(UserId),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Global => f.write_str("commissions"),
            CacheKey::User(user_id) => write!(f, "commissions_{}", user_id),
        }
    }
}

/// Snapshot of a key's generation taken before a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTicket {
    /// Incremented by every [`CommissionCache::invalidate`] of the key.
    pub generation: u64,
}

/// Shared cache for commission sets.
///
/// Implementations must be safe for concurrent use. Errors are reported as
/// `CommissionError::Cache`; callers treat them as non-fatal.
#[async_trait]
pub trait CommissionCache: Send + Sync {
    /// Returns the cached value, `None` on a miss or after expiry.
    async fn get(&self, key: &CacheKey) -> CommissionResult<Option<CommissionSet>>;

    /// Returns the current ticket for `key`.
    async fn ticket(&self, key: &CacheKey) -> CommissionResult<CacheTicket>;

    /// Stores `value` if `ticket` is still current for `key`.
    ///
    /// Returns `true` when the value was stored.
    async fn insert(
        &self,
        key: &CacheKey,
        ticket: CacheTicket,
        value: CommissionSet,
    ) -> CommissionResult<bool>;

    /// Deletes the cached value and makes outstanding tickets stale.
    async fn invalidate(&self, key: &CacheKey) -> CommissionResult<()>;
}

/// Cache performance statistics.
///
/// # Examples
///
/// ```
/// use commission_manager::CacheStatistics;
///
/// let stats = CacheStatistics {
///     total_requests: 100,
///     cache_hits: 75,
///     cache_misses: 25,
///     rejected_inserts: 0,
///     cached_entries: 10,
/// };
///
/// assert_eq!(stats.hit_ratio(), 0.75);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStatistics {
    /// Total number of lookups
    pub total_requests: u64,

    /// Lookups answered from the cache
    pub cache_hits: u64,

    /// Lookups that found nothing or an expired entry
    pub cache_misses: u64,

    /// Inserts refused because their ticket was stale
    pub rejected_inserts: u64,

    /// Current number of cached entries
    pub cached_entries: usize,
}

impl CacheStatistics {
    /// Cache hit ratio (0.0 to 1.0), 0.0 before the first request.
    pub fn hit_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: CommissionSet,

    /// `None` when the TTL is too large to represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    generations: HashMap<CacheKey, u64>,
}

impl CacheState {
    fn ticket(&self, key: &CacheKey) -> CacheTicket {
        CacheTicket {
            generation: self.generations.get(key).copied().unwrap_or(0),
        }
    }
}

/// Process-local cache with a fixed time to live.
///
/// # Cache Behavior
///
/// - Entries expire `ttl` after insertion
/// - Invalidation removes the entry and bumps the key's generation
/// - Thread-safe concurrent access via `RwLock`
#[derive(Debug, Clone)]
pub struct InMemoryCommissionCache {
    ttl: Duration,
    state: Arc<RwLock<CacheState>>,
    stats: Arc<RwLock<CacheStatistics>>,
}

impl InMemoryCommissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Arc::new(RwLock::new(CacheState::default())),
            stats: Arc::new(RwLock::new(CacheStatistics::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot of cache performance metrics.
    pub fn cache_statistics(&self) -> CommissionResult<CacheStatistics> {
        let stats = self.stats.read().map_err(poisoned)?;
        Ok(*stats)
    }

    fn read_state(&self) -> CommissionResult<RwLockReadGuard<'_, CacheState>> {
        self.state.read().map_err(poisoned)
    }

    fn write_state(&self) -> CommissionResult<RwLockWriteGuard<'_, CacheState>> {
        self.state.write().map_err(poisoned)
    }

    fn record<F>(&self, update: F) -> CommissionResult<()>
    where
        F: FnOnce(&mut CacheStatistics),
    {
        let mut stats = self.stats.write().map_err(poisoned)?;
        update(&mut stats);
        Ok(())
    }
}

#[async_trait]
impl CommissionCache for InMemoryCommissionCache {
    async fn get(&self, key: &CacheKey) -> CommissionResult<Option<CommissionSet>> {
        let hit = {
            let state = self.read_state()?;
            state
                .entries
                .get(key)
                .filter(|entry| entry.is_live(Instant::now()))
                .map(|entry| entry.value.clone())
        };

        if hit.is_some() {
            debug!(message = "Commission cache hit", key = %key);
        } else {
            debug!(message = "Commission cache miss", key = %key);
        }

        self.record(|stats| {
            stats.total_requests += 1;
            if hit.is_some() {
                stats.cache_hits += 1;
            } else {
                stats.cache_misses += 1;
            }
        })?;

        Ok(hit)
    }

    async fn ticket(&self, key: &CacheKey) -> CommissionResult<CacheTicket> {
        Ok(self.read_state()?.ticket(key))
    }

    async fn insert(
        &self,
        key: &CacheKey,
        ticket: CacheTicket,
        value: CommissionSet,
    ) -> CommissionResult<bool> {
        let cached_entries = {
            let mut state = self.write_state()?;
            if state.ticket(key) != ticket {
                None
            } else {
                state.entries.insert(
                    *key,
                    CacheEntry {
                        value,
                        expires_at: Instant::now().checked_add(self.ttl),
                    },
                );
                Some(state.entries.len())
            }
        };

        match cached_entries {
            Some(count) => {
                self.record(|stats| stats.cached_entries = count)?;
                debug!(message = "Cached commission set", key = %key);
                Ok(true)
            }
            None => {
                self.record(|stats| stats.rejected_inserts += 1)?;
                debug!(message = "Rejected stale commission cache insert", key = %key);
                Ok(false)
            }
        }
    }

    async fn invalidate(&self, key: &CacheKey) -> CommissionResult<()> {
        let count = {
            let mut state = self.write_state()?;
            state.entries.remove(key);
            *state.generations.entry(*key).or_insert(0) += 1;
            state.entries.len()
        };
        self.record(|stats| stats.cached_entries = count)?;
        debug!(message = "Invalidated commission cache entry", key = %key);
        Ok(())
    }
}

/// Cache that never stores anything.
///
/// Used when caching is disabled in the settings; every read goes to
/// persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCommissionCache;

#[async_trait]
impl CommissionCache for DisabledCommissionCache {
    async fn get(&self, _key: &CacheKey) -> CommissionResult<Option<CommissionSet>> {
        Ok(None)
    }

    async fn ticket(&self, _key: &CacheKey) -> CommissionResult<CacheTicket> {
        Ok(CacheTicket { generation: 0 })
    }

    async fn insert(
        &self,
        _key: &CacheKey,
        _ticket: CacheTicket,
        _value: CommissionSet,
    ) -> CommissionResult<bool> {
        Ok(false)
    }

    async fn invalidate(&self, _key: &CacheKey) -> CommissionResult<()> {
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CommissionError {
    CommissionError::Cache {
        reason: "cache lock poisoned".to_string(),
    }
}
