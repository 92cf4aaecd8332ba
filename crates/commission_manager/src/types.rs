//! Core commission domain types.
//!
//! The engine stores commissions in a flat shape: two maps (`transfer` and
//! `withdraw`) keyed by [`Asset`] plus four scalar rates. Every individual
//! value is addressed by a [`Leaf`], which is the unit of customization for
//! per-user overrides.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

/// Identifier of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Internal asset key of the flat `transfer` / `withdraw` maps.
///
/// Stablecoins are keyed by network (`ERC20`, `TRC20`, `BEP20`) rather than by
/// coin. `SWP_SS` only exists on the withdraw side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "TRC20")]
    Trc20,
    #[serde(rename = "BEP20")]
    Bep20,
    #[serde(rename = "TRX")]
    Trx,
    #[serde(rename = "BNB")]
    Bnb,
    #[serde(rename = "SWP")]
    Swp,
    #[serde(rename = "SWP_SS")]
    SwpSs,
    #[serde(rename = "SWCT")]
    Swct,
}

impl Asset {
    /// Assets carried by the `transfer` map.
    pub const TRANSFER: [Asset; 11] = [
        Asset::Usd,
        Asset::Eur,
        Asset::Btc,
        Asset::Eth,
        Asset::Erc20,
        Asset::Trc20,
        Asset::Bep20,
        Asset::Trx,
        Asset::Bnb,
        Asset::Swp,
        Asset::Swct,
    ];

    /// Assets carried by the `withdraw` map.
    pub const WITHDRAW: [Asset; 12] = [
        Asset::Usd,
        Asset::Eur,
        Asset::Btc,
        Asset::Eth,
        Asset::Erc20,
        Asset::Trc20,
        Asset::Bep20,
        Asset::Trx,
        Asset::Bnb,
        Asset::Swp,
        Asset::Swct,
        Asset::SwpSs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Usd => "USD",
            Asset::Eur => "EUR",
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Erc20 => "ERC20",
            Asset::Trc20 => "TRC20",
            Asset::Bep20 => "BEP20",
            Asset::Trx => "TRX",
            Asset::Bnb => "BNB",
            Asset::Swp => "SWP",
            Asset::SwpSs => "SWP_SS",
            Asset::Swct => "SWCT",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a single commission value inside a [`CommissionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Leaf {
    Transfer(Asset),
    Withdraw(Asset),
    Exchange,
    CustomExchange,
    Custom2Exchange,
    Replenishment,
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Transfer(asset) => write!(f, "transfer.{}", asset),
            Leaf::Withdraw(asset) => write!(f, "withdraw.{}", asset),
            Leaf::Exchange => f.write_str("exchange"),
            Leaf::CustomExchange => f.write_str("custom_exchange_commission"),
            Leaf::Custom2Exchange => f.write_str("custom2_exchange_commission"),
            Leaf::Replenishment => f.write_str("replenishment"),
        }
    }
}

/// Flat commission configuration.
///
/// Used both for the global configuration and for per-user overrides. In an
/// override every leaf is independently present (explicitly set for the user)
/// or absent (inherits the global value at read time).
///
/// # Examples
///
/// ```
/// use commission_manager::{Asset, CommissionSet, Leaf};
/// use rust_decimal::Decimal;
///
/// let global = CommissionSet::new()
///     .with(Leaf::Transfer(Asset::Usd), Decimal::ONE)
///     .with(Leaf::Exchange, Decimal::new(996, 3));
/// let user = CommissionSet::new().with(Leaf::Transfer(Asset::Usd), Decimal::new(5, 0));
///
/// let effective = user.resolve(&global);
/// assert_eq!(effective.get(Leaf::Transfer(Asset::Usd)), Some(Decimal::new(5, 0)));
/// assert_eq!(effective.get(Leaf::Exchange), Some(Decimal::new(996, 3)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommissionSet {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transfer: BTreeMap<Asset, Decimal>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub withdraw: BTreeMap<Asset, Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_exchange_commission: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom2_exchange_commission: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replenishment: Option<Decimal>,
}

impl CommissionSet {
    /// Creates a set with every leaf absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`CommissionSet::set`].
    pub fn with(mut self, leaf: Leaf, value: Decimal) -> Self {
        self.set(leaf, value);
        self
    }

    /// Returns `true` when no leaf is present.
    pub fn is_empty(&self) -> bool {
        self.transfer.is_empty()
            && self.withdraw.is_empty()
            && self.exchange.is_none()
            && self.custom_exchange_commission.is_none()
            && self.custom2_exchange_commission.is_none()
            && self.replenishment.is_none()
    }

    pub fn get(&self, leaf: Leaf) -> Option<Decimal> {
        match leaf {
            Leaf::Transfer(asset) => self.transfer.get(&asset).copied(),
            Leaf::Withdraw(asset) => self.withdraw.get(&asset).copied(),
            Leaf::Exchange => self.exchange,
            Leaf::CustomExchange => self.custom_exchange_commission,
            Leaf::Custom2Exchange => self.custom2_exchange_commission,
            Leaf::Replenishment => self.replenishment,
        }
    }

    pub fn set(&mut self, leaf: Leaf, value: Decimal) {
        match leaf {
            Leaf::Transfer(asset) => {
                self.transfer.insert(asset, value);
            }
            Leaf::Withdraw(asset) => {
                self.withdraw.insert(asset, value);
            }
            Leaf::Exchange => self.exchange = Some(value),
            Leaf::CustomExchange => self.custom_exchange_commission = Some(value),
            Leaf::Custom2Exchange => self.custom2_exchange_commission = Some(value),
            Leaf::Replenishment => self.replenishment = Some(value),
        }
    }

    /// Present leaves with their values.
    ///
    /// Map entries are reported even for assets outside the known catalog so
    /// that stored data is never silently dropped.
    pub fn leaves(&self) -> Vec<(Leaf, Decimal)> {
        let mut leaves: Vec<(Leaf, Decimal)> = self
            .transfer
            .iter()
            .map(|(asset, value)| (Leaf::Transfer(*asset), *value))
            .collect();
        leaves.extend(
            self.withdraw
                .iter()
                .map(|(asset, value)| (Leaf::Withdraw(*asset), *value)),
        );
        for leaf in [
            Leaf::Exchange,
            Leaf::CustomExchange,
            Leaf::Custom2Exchange,
            Leaf::Replenishment,
        ] {
            if let Some(value) = self.get(leaf) {
                leaves.push((leaf, value));
            }
        }
        leaves
    }

    /// Effective configuration when `self` is layered over `global`.
    ///
    /// Present leaves win; absent leaves take the global value.
    pub fn resolve(&self, global: &CommissionSet) -> CommissionSet {
        let mut effective = global.clone();
        for (leaf, value) in self.leaves() {
            effective.set(leaf, value);
        }
        effective
    }
}
