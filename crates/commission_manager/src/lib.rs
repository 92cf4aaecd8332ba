//! Commission configuration engine.
//!
//! Manages a two-tier commission schedule: one global configuration and
//! per-user overrides that only hold the fields an operator customized for
//! that user. The crate covers
//!
//! - translation between the nested external document and the flat internal
//!   set ([`mapper`]),
//! - reconciliation of overrides when the global configuration changes
//!   ([`merger`]),
//! - a read-through cache that stays consistent with writes ([`store`]),
//! - the [`CommissionService`] that ties them together.
//!
//! Persistence, caching and auditing are reached through the
//! [`CommissionRepository`], [`CommissionCache`] and [`AuditLog`] traits.

// Domain model
pub mod document;
pub mod errors;
pub mod types;

// Core logic
pub mod mapper;
pub mod merger;

// Collaborator ports and reference adapters
pub mod audit;
pub mod cache;
pub mod repository;

// Orchestration
pub mod service;
pub mod settings;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use audit::{ActorContext, AuditAction, AuditEvent, AuditLog, TracingAuditLog};
pub use cache::{
    CacheKey, CacheStatistics, CacheTicket, CommissionCache, DisabledCommissionCache,
    InMemoryCommissionCache,
};
pub use document::{
    BitcoinRail, Bep20Rail, CommissionDocument, Erc20Rail, FiatRails, StablecoinRails, SwpRails,
    TransferSchedule, Trc20Rail,
};
pub use errors::{CommissionError, CommissionResult};
pub use merger::{OverrideMerger, Reconciliation};
pub use repository::{
    CommissionRepository, CommissionSnapshot, InMemoryCommissionRepository, UserIdentity,
    UserRecord, UserSettings,
};
pub use service::{CommissionService, CustomizedUser, GlobalChangeSummary, UserCommissionLookup};
pub use settings::{CacheSettings, CommissionSettings, DEFAULT_CACHE_TTL_SECONDS};
pub use store::CachedConfigStore;
pub use types::{Asset, CommissionSet, Leaf, UserId};
