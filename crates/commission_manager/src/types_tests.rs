//! Tests for commission domain types.

use super::*;
use rust_decimal_macros::dec;

#[test]
fn test_user_id_display_and_value() {
    let id = UserId::new(17);
    assert_eq!(id.value(), 17);
    assert_eq!(id.to_string(), "17");
    assert_eq!(UserId::from(17), id);
}

#[test]
fn test_asset_wire_names() {
    assert_eq!(Asset::SwpSs.as_str(), "SWP_SS");
    assert_eq!(Asset::Erc20.to_string(), "ERC20");
    assert_eq!(serde_json::to_string(&Asset::Usd).unwrap(), "\"USD\"");
    assert_eq!(
        serde_json::from_str::<Asset>("\"SWP_SS\"").unwrap(),
        Asset::SwpSs
    );
}

#[test]
fn test_swp_ss_is_withdraw_only() {
    assert!(!Asset::TRANSFER.contains(&Asset::SwpSs));
    assert!(Asset::WITHDRAW.contains(&Asset::SwpSs));
}

#[test]
fn test_asset_catalog_sizes() {
    assert_eq!(Asset::TRANSFER.len(), 11);
    assert_eq!(Asset::WITHDRAW.len(), 12);
}

#[test]
fn test_leaf_display() {
    assert_eq!(Leaf::Transfer(Asset::Btc).to_string(), "transfer.BTC");
    assert_eq!(Leaf::Withdraw(Asset::SwpSs).to_string(), "withdraw.SWP_SS");
    assert_eq!(Leaf::CustomExchange.to_string(), "custom_exchange_commission");
}

#[test]
fn test_new_set_is_empty() {
    let set = CommissionSet::new();
    assert!(set.is_empty());
    assert!(set.leaves().is_empty());
}

#[test]
fn test_set_and_get_each_kind_of_leaf() {
    let mut catalog: Vec<Leaf> = Asset::TRANSFER.iter().copied().map(Leaf::Transfer).collect();
    catalog.extend(Asset::WITHDRAW.iter().copied().map(Leaf::Withdraw));
    catalog.extend([
        Leaf::Exchange,
        Leaf::CustomExchange,
        Leaf::Custom2Exchange,
        Leaf::Replenishment,
    ]);

    let mut set = CommissionSet::new();
    for (index, leaf) in catalog.iter().copied().enumerate() {
        let value = Decimal::from(index as i64);
        set.set(leaf, value);
        assert_eq!(set.get(leaf), Some(value), "leaf {}", leaf);
    }

    assert_eq!(set.leaves().len(), 27);
    assert_eq!(set.transfer.len(), 11);
    assert_eq!(set.withdraw.len(), 12);
}

#[test]
fn test_single_leaf_makes_set_non_empty() {
    let set = CommissionSet::new().with(Leaf::Replenishment, dec!(2.3));
    assert!(!set.is_empty());
    assert_eq!(set.leaves(), vec![(Leaf::Replenishment, dec!(2.3))]);
}

#[test]
fn test_resolve_fills_absent_leaves_from_global() {
    let global = CommissionSet::new()
        .with(Leaf::Transfer(Asset::Usd), dec!(1))
        .with(Leaf::Transfer(Asset::Btc), dec!(0.0005))
        .with(Leaf::Exchange, dec!(0.996));
    let user = CommissionSet::new().with(Leaf::Transfer(Asset::Btc), dec!(0.001));

    let effective = user.resolve(&global);

    assert_eq!(effective.get(Leaf::Transfer(Asset::Usd)), Some(dec!(1)));
    assert_eq!(effective.get(Leaf::Transfer(Asset::Btc)), Some(dec!(0.001)));
    assert_eq!(effective.get(Leaf::Exchange), Some(dec!(0.996)));
}

#[test]
fn test_resolve_of_empty_override_is_global() {
    let global = CommissionSet::new().with(Leaf::Exchange, dec!(0.996));
    assert_eq!(CommissionSet::new().resolve(&global), global);
}

#[test]
fn test_json_shape_skips_absent_leaves() {
    let set = CommissionSet::new()
        .with(Leaf::Withdraw(Asset::SwpSs), dec!(3))
        .with(Leaf::Exchange, dec!(0.996));

    let json = serde_json::to_value(&set).unwrap();
    let object = json.as_object().unwrap();

    assert!(object.contains_key("withdraw"));
    assert!(object.contains_key("exchange"));
    assert!(!object.contains_key("transfer"));
    assert!(!object.contains_key("replenishment"));

    let back: CommissionSet = serde_json::from_value(json).unwrap();
    assert_eq!(back, set);
}
