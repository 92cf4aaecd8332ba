//! Translation between the external document and the flat internal set.
//!
//! Both directions are pure and total. Several external leaves feed more than
//! one internal leaf: every crypto method is stored under the same asset key
//! in both the `transfer` and the `withdraw` map, while the fiat currencies
//! split into `SW` (transfer) and `PM` (withdraw).
//!
//! | Internal key        | transfer source          | withdraw source          |
//! |---------------------|--------------------------|--------------------------|
//! | USD                 | USD.SW                   | USD.PM                   |
//! | EUR                 | EUR.SW                   | EUR.PM                   |
//! | BTC                 | BTC.BTC                  | BTC.BTC                  |
//! | ETH                 | ETH.ERC20                | ETH.ERC20                |
//! | ERC20/TRC20/BEP20   | USDT.{ERC20,TRC20,BEP20} | USDT.{ERC20,TRC20,BEP20} |
//! | TRX                 | TRX.TRC20                | TRX.TRC20                |
//! | BNB                 | BNB.BEP20                | BNB.BEP20                |
//! | SWP                 | SWP.BEP20                | SWP.BEP20                |
//! | SWP_SS              | -                        | SWP.SS                   |
//! | SWCT                | SWCT.BEP20               | SWCT.BEP20               |
//!
//! The two custom exchange rates fall back to `exchange` in both directions.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::document::{
    BitcoinRail, Bep20Rail, CommissionDocument, Erc20Rail, FiatRails, StablecoinRails, SwpRails,
    TransferSchedule, Trc20Rail,
};
use crate::types::{Asset, CommissionSet};

#[cfg(test)]
#[path = "mapper_tests.rs"]
mod tests;

/// Maps an external document onto the flat internal shape.
///
/// Leaves absent from the document stay absent, except the custom exchange
/// rates which default to `exchange`.
///
/// # Examples
///
/// ```
/// use commission_manager::{mapper, Asset, CommissionDocument};
/// use rust_decimal::Decimal;
///
/// let mut document = CommissionDocument::default();
/// document.transfer.btc.btc = Some(Decimal::new(5, 4));
/// document.exchange = Some(Decimal::new(996, 3));
///
/// let internal = mapper::to_internal(&document);
/// assert_eq!(internal.transfer[&Asset::Btc], Decimal::new(5, 4));
/// assert_eq!(internal.withdraw[&Asset::Btc], Decimal::new(5, 4));
/// assert_eq!(internal.custom_exchange_commission, Some(Decimal::new(996, 3)));
/// ```
pub fn to_internal(document: &CommissionDocument) -> CommissionSet {
    let t = &document.transfer;

    let mut transfer = BTreeMap::new();
    put(&mut transfer, Asset::Usd, t.usd.sw);
    put(&mut transfer, Asset::Eur, t.eur.sw);
    put(&mut transfer, Asset::Btc, t.btc.btc);
    put(&mut transfer, Asset::Eth, t.eth.erc20);
    put(&mut transfer, Asset::Erc20, t.usdt.erc20);
    put(&mut transfer, Asset::Trc20, t.usdt.trc20);
    put(&mut transfer, Asset::Bep20, t.usdt.bep20);
    put(&mut transfer, Asset::Trx, t.trx.trc20);
    put(&mut transfer, Asset::Bnb, t.bnb.bep20);
    put(&mut transfer, Asset::Swp, t.swp.bep20);
    put(&mut transfer, Asset::Swct, t.swct.bep20);

    let mut withdraw = BTreeMap::new();
    put(&mut withdraw, Asset::Usd, t.usd.pm);
    put(&mut withdraw, Asset::Eur, t.eur.pm);
    put(&mut withdraw, Asset::Btc, t.btc.btc);
    put(&mut withdraw, Asset::Eth, t.eth.erc20);
    put(&mut withdraw, Asset::Erc20, t.usdt.erc20);
    put(&mut withdraw, Asset::Trc20, t.usdt.trc20);
    put(&mut withdraw, Asset::Bep20, t.usdt.bep20);
    put(&mut withdraw, Asset::Trx, t.trx.trc20);
    put(&mut withdraw, Asset::Bnb, t.bnb.bep20);
    put(&mut withdraw, Asset::Swp, t.swp.bep20);
    put(&mut withdraw, Asset::Swct, t.swct.bep20);
    put(&mut withdraw, Asset::SwpSs, t.swp.ss);

    CommissionSet {
        transfer,
        withdraw,
        exchange: document.exchange,
        custom_exchange_commission: document.custom_exchange_commission.or(document.exchange),
        custom2_exchange_commission: document.custom2_exchange_commission.or(document.exchange),
        replenishment: document.replenishment,
    }
}

/// Regroups a flat set into the external document.
///
/// Returns `None` when the `transfer` map is empty: without it the set is
/// treated as holding no configuration, even if scalar or withdraw leaves are
/// present. Crypto methods are rendered from the `transfer` map; only
/// `USD.PM`, `EUR.PM` and `SWP.SS` come from the `withdraw` map.
pub fn to_external(set: &CommissionSet) -> Option<CommissionDocument> {
    if set.transfer.is_empty() {
        return None;
    }

    let transfer = |asset: Asset| set.transfer.get(&asset).copied();
    let withdraw = |asset: Asset| set.withdraw.get(&asset).copied();

    Some(CommissionDocument {
        transfer: TransferSchedule {
            usd: FiatRails {
                sw: transfer(Asset::Usd),
                pm: withdraw(Asset::Usd),
            },
            eur: FiatRails {
                sw: transfer(Asset::Eur),
                pm: withdraw(Asset::Eur),
            },
            btc: BitcoinRail {
                btc: transfer(Asset::Btc),
            },
            eth: Erc20Rail {
                erc20: transfer(Asset::Eth),
            },
            usdt: StablecoinRails {
                erc20: transfer(Asset::Erc20),
                trc20: transfer(Asset::Trc20),
                bep20: transfer(Asset::Bep20),
            },
            trx: Trc20Rail {
                trc20: transfer(Asset::Trx),
            },
            bnb: Bep20Rail {
                bep20: transfer(Asset::Bnb),
            },
            swp: SwpRails {
                bep20: transfer(Asset::Swp),
                ss: withdraw(Asset::SwpSs),
            },
            swct: Bep20Rail {
                bep20: transfer(Asset::Swct),
            },
        },
        exchange: set.exchange,
        custom_exchange_commission: set.custom_exchange_commission.or(set.exchange),
        custom2_exchange_commission: set.custom2_exchange_commission.or(set.exchange),
        replenishment: set.replenishment,
    })
}

fn put(map: &mut BTreeMap<Asset, Decimal>, asset: Asset, value: Option<Decimal>) {
    if let Some(value) = value {
        map.insert(asset, value);
    }
}
