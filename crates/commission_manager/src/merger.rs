//! Override merge engine.
//!
//! When the global configuration changes every stored user override is
//! reconciled against the old and the new global value, one leaf at a time:
//!
//! 1. An absent leaf stays absent.
//! 2. A leaf equal to the old global value is treated as not customized and
//!    takes the new global value.
//! 3. A leaf that differs from the old global value is a deliberate
//!    customization and is kept.
//!
//! Equality is exact on the decimal representation: `1.0` and `1` differ,
//! so an override stored as `1.0` against a global `1` is a customization.
//!
//! Rule 2 cannot tell apart a value that was deliberately set to the old
//! default from one that was inherited. That ambiguity is accepted.
//!
//! # Examples
//!
//! ```rust
//! use commission_manager::{Asset, CommissionSet, Leaf, OverrideMerger};
//! use rust_decimal::Decimal;
//!
//! let usd = Leaf::Transfer(Asset::Usd);
//! let old_global = CommissionSet::new().with(usd, Decimal::ONE);
//! let new_global = CommissionSet::new().with(usd, Decimal::new(2, 0));
//! let user = CommissionSet::new().with(usd, Decimal::ONE);
//!
//! let merger = OverrideMerger::new();
//! let result = merger.reconcile(Some(&old_global), &new_global, &user);
//! assert_eq!(result.updated.get(usd), Some(Decimal::new(2, 0)));
//! assert_eq!(result.refreshed, vec![usd]);
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{CommissionSet, Leaf};

#[cfg(test)]
#[path = "merger_tests.rs"]
mod tests;

/// Outcome of reconciling one override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The override after reconciliation.
    pub updated: CommissionSet,

    /// Leaves that took a new value from the new global configuration.
    pub refreshed: Vec<Leaf>,

    /// Leaves kept as deliberate customizations.
    pub preserved: Vec<Leaf>,
}

impl Reconciliation {
    /// Returns `true` when reconciliation changed at least one value.
    pub fn is_changed(&self) -> bool {
        !self.refreshed.is_empty()
    }
}

/// Stateless per-leaf reconciler for user overrides.
#[derive(Debug, Clone, Default)]
pub struct OverrideMerger {}

impl OverrideMerger {
    pub fn new() -> Self {
        Self {}
    }

    /// Reconciles `user_override` for a global change from `old_global` to
    /// `new_global`.
    ///
    /// # Arguments
    ///
    /// * `old_global` - Global configuration before the change, `None` when
    ///   no global configuration was ever stored
    /// * `new_global` - Global configuration being written
    /// * `user_override` - Stored override of one user
    ///
    /// # Returns
    ///
    /// The reconciled override together with the refreshed and preserved
    /// leaves. Without an old global every present leaf is preserved. When the
    /// new global lacks a leaf that would be refreshed, the override value is
    /// kept and counted as preserved.
    pub fn reconcile(
        &self,
        old_global: Option<&CommissionSet>,
        new_global: &CommissionSet,
        user_override: &CommissionSet,
    ) -> Reconciliation {
        let mut updated = user_override.clone();
        let mut refreshed = Vec::new();
        let mut preserved = Vec::new();

        for (leaf, value) in user_override.leaves() {
            let inherited = old_global
                .and_then(|g| g.get(leaf))
                .is_some_and(|old_value| same_representation(old_value, value));
            match (inherited, new_global.get(leaf)) {
                (true, Some(new_value)) if !same_representation(new_value, value) => {
                    updated.set(leaf, new_value);
                    refreshed.push(leaf);
                }
                // Still tracks the global value
                (true, Some(_)) => {}
                _ => preserved.push(leaf),
            }
        }

        debug!(
            message = "Reconciled override",
            refreshed = refreshed.len(),
            preserved = preserved.len()
        );

        Reconciliation {
            updated,
            refreshed,
            preserved,
        }
    }
}

/// `Decimal`'s `==` ignores scale; the merge rules do not.
fn same_representation(a: Decimal, b: Decimal) -> bool {
    a == b && a.scale() == b.scale()
}
