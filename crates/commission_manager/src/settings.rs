//! Engine settings.
//!
//! Deserialized from the `[cache]` table of the host configuration. Every key
//! is optional:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 36000000
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CommissionCache, DisabledCommissionCache, InMemoryCommissionCache};

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

/// Default lifetime of a cached commission set.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 36_000_000;

/// Settings of the commission engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommissionSettings {
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Cache section of [`CommissionSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// When `false` every read goes to persistence.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

impl CommissionSettings {
    /// Builds the cache described by these settings.
    pub fn build_cache(&self) -> Arc<dyn CommissionCache> {
        if self.cache.enabled {
            Arc::new(InMemoryCommissionCache::new(self.cache.ttl()))
        } else {
            Arc::new(DisabledCommissionCache)
        }
    }
}
