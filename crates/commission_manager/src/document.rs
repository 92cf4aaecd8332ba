//! External (presentation) representation of a commission configuration.
//!
//! Operators read and write commissions grouped by currency and payment
//! method, e.g. `transfer.USD.SW` or `transfer.USDT.TRC20`. This module holds
//! the typed form of that document together with the boundary validation
//! that runs before a document is handed to the mapper.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "transfer": {
//!     "USD": { "SW": 1, "PM": 1 },
//!     "EUR": { "SW": 0, "PM": 1 },
//!     "BTC": { "BTC": 0.0005 },
//!     "ETH": { "ERC20": 0.008 },
//!     "USDT": { "ERC20": 25, "TRC20": 1, "BEP20": 1 },
//!     "TRX": { "TRC20": 1 },
//!     "BNB": { "BEP20": 0.01 },
//!     "SWP": { "BEP20": 1, "SS": 0 },
//!     "SWCT": { "BEP20": 1 }
//!   },
//!   "exchange": 0.996,
//!   "custom_exchange_commission": 0.995,
//!   "custom2_exchange_commission": 0.99,
//!   "replenishment": 2.3
//! }
//! ```
//!
//! Leaves are accepted as JSON numbers or numeric strings. Output always
//! encodes them as strings (`"exchange": "0.996"`) so that the decimal scale
//! survives serialization; a document submitted with numbers therefore comes
//! back with the same values in string form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{CommissionError, CommissionResult};

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

/// Commission configuration in its external, nested shape.
///
/// Every leaf is optional in the type so that a partially stored override can
/// be rendered with its absent fields literally absent. Write paths call
/// [`CommissionDocument::validate`] before mapping, which enforces that all
/// required leaves are present and that exchange rates are in range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommissionDocument {
    #[serde(default)]
    pub transfer: TransferSchedule,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_exchange_commission: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom2_exchange_commission: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replenishment: Option<Decimal>,
}

/// Transfer and withdraw amounts grouped by currency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferSchedule {
    #[serde(rename = "USD", default, skip_serializing_if = "FiatRails::is_empty")]
    pub usd: FiatRails,

    #[serde(rename = "EUR", default, skip_serializing_if = "FiatRails::is_empty")]
    pub eur: FiatRails,

    #[serde(rename = "BTC", default, skip_serializing_if = "BitcoinRail::is_empty")]
    pub btc: BitcoinRail,

    #[serde(rename = "ETH", default, skip_serializing_if = "Erc20Rail::is_empty")]
    pub eth: Erc20Rail,

    #[serde(rename = "USDT", default, skip_serializing_if = "StablecoinRails::is_empty")]
    pub usdt: StablecoinRails,

    #[serde(rename = "TRX", default, skip_serializing_if = "Trc20Rail::is_empty")]
    pub trx: Trc20Rail,

    #[serde(rename = "BNB", default, skip_serializing_if = "Bep20Rail::is_empty")]
    pub bnb: Bep20Rail,

    #[serde(rename = "SWP", default, skip_serializing_if = "SwpRails::is_empty")]
    pub swp: SwpRails,

    #[serde(rename = "SWCT", default, skip_serializing_if = "Bep20Rail::is_empty")]
    pub swct: Bep20Rail,
}

/// Fiat methods: `SW` (transfer) and `PM` (withdraw).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FiatRails {
    #[serde(rename = "SW", default, skip_serializing_if = "Option::is_none")]
    pub sw: Option<Decimal>,

    #[serde(rename = "PM", default, skip_serializing_if = "Option::is_none")]
    pub pm: Option<Decimal>,
}

impl FiatRails {
    pub fn is_empty(&self) -> bool {
        self.sw.is_none() && self.pm.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BitcoinRail {
    #[serde(rename = "BTC", default, skip_serializing_if = "Option::is_none")]
    pub btc: Option<Decimal>,
}

impl BitcoinRail {
    pub fn is_empty(&self) -> bool {
        self.btc.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Erc20Rail {
    #[serde(rename = "ERC20", default, skip_serializing_if = "Option::is_none")]
    pub erc20: Option<Decimal>,
}

impl Erc20Rail {
    pub fn is_empty(&self) -> bool {
        self.erc20.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trc20Rail {
    #[serde(rename = "TRC20", default, skip_serializing_if = "Option::is_none")]
    pub trc20: Option<Decimal>,
}

impl Trc20Rail {
    pub fn is_empty(&self) -> bool {
        self.trc20.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bep20Rail {
    #[serde(rename = "BEP20", default, skip_serializing_if = "Option::is_none")]
    pub bep20: Option<Decimal>,
}

impl Bep20Rail {
    pub fn is_empty(&self) -> bool {
        self.bep20.is_none()
    }
}

/// USDT on its three supported networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StablecoinRails {
    #[serde(rename = "ERC20", default, skip_serializing_if = "Option::is_none")]
    pub erc20: Option<Decimal>,

    #[serde(rename = "TRC20", default, skip_serializing_if = "Option::is_none")]
    pub trc20: Option<Decimal>,

    #[serde(rename = "BEP20", default, skip_serializing_if = "Option::is_none")]
    pub bep20: Option<Decimal>,
}

impl StablecoinRails {
    pub fn is_empty(&self) -> bool {
        self.erc20.is_none() && self.trc20.is_none() && self.bep20.is_none()
    }
}

/// SWP on BEP20 plus the withdraw-only `SS` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwpRails {
    #[serde(rename = "BEP20", default, skip_serializing_if = "Option::is_none")]
    pub bep20: Option<Decimal>,

    #[serde(rename = "SS", default, skip_serializing_if = "Option::is_none")]
    pub ss: Option<Decimal>,
}

impl SwpRails {
    pub fn is_empty(&self) -> bool {
        self.bep20.is_none() && self.ss.is_none()
    }
}

impl CommissionDocument {
    /// Parses a JSON value into a document.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Validation` when the value has the wrong
    /// structure or a leaf is not a number.
    pub fn from_json(value: serde_json::Value) -> CommissionResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| CommissionError::validation("data", e.to_string()))
    }

    /// Parses a JSON string into a document.
    pub fn from_json_str(content: &str) -> CommissionResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| CommissionError::validation("data", e.to_string()))
    }

    /// Returns `true` when the document carries no value at all.
    pub fn is_empty(&self) -> bool {
        self.required_leaves().iter().all(|(_, v)| v.is_none())
            && self.custom_exchange_commission.is_none()
            && self.custom2_exchange_commission.is_none()
    }

    /// Checks that the document can be stored as a full configuration.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Validation` naming the first missing leaf
    /// (e.g. `transfer.USDT.TRC20`), or the first exchange rate outside the
    /// `(0, 1]` range.
    pub fn validate(&self) -> CommissionResult<()> {
        if let Some((path, _)) = self
            .required_leaves()
            .into_iter()
            .find(|(_, value)| value.is_none())
        {
            return Err(CommissionError::validation(path, "missing required field"));
        }

        for (name, rate) in [
            ("exchange", self.exchange),
            ("custom_exchange_commission", self.custom_exchange_commission),
            ("custom2_exchange_commission", self.custom2_exchange_commission),
        ] {
            if let Some(rate) = rate {
                if rate <= Decimal::ZERO || rate > Decimal::ONE {
                    return Err(CommissionError::validation(
                        name,
                        format!("Value {} must be greater than 0 and at most 1", name),
                    ));
                }
            }
        }

        Ok(())
    }

    fn required_leaves(&self) -> [(&'static str, Option<Decimal>); 16] {
        let t = &self.transfer;
        [
            ("transfer.USD.SW", t.usd.sw),
            ("transfer.USD.PM", t.usd.pm),
            ("transfer.EUR.SW", t.eur.sw),
            ("transfer.EUR.PM", t.eur.pm),
            ("transfer.BTC.BTC", t.btc.btc),
            ("transfer.ETH.ERC20", t.eth.erc20),
            ("transfer.USDT.ERC20", t.usdt.erc20),
            ("transfer.USDT.TRC20", t.usdt.trc20),
            ("transfer.USDT.BEP20", t.usdt.bep20),
            ("transfer.TRX.TRC20", t.trx.trc20),
            ("transfer.BNB.BEP20", t.bnb.bep20),
            ("transfer.SWP.BEP20", t.swp.bep20),
            ("transfer.SWP.SS", t.swp.ss),
            ("transfer.SWCT.BEP20", t.swct.bep20),
            ("exchange", self.exchange),
            ("replenishment", self.replenishment),
        ]
    }
}
