//! Shared test fixtures.

use rust_decimal_macros::dec;
use serde_json::json;

use crate::document::CommissionDocument;

/// Complete document in the JSON shape operators submit.
pub(crate) fn sample_json() -> serde_json::Value {
    json!({
        "transfer": {
            "USD": { "SW": "1", "PM": "1.5" },
            "EUR": { "SW": "0", "PM": "1" },
            "BTC": { "BTC": "0.0005" },
            "ETH": { "ERC20": "0.008" },
            "USDT": { "ERC20": "25", "TRC20": "1", "BEP20": "0.8" },
            "TRX": { "TRC20": "1" },
            "BNB": { "BEP20": "0.01" },
            "SWP": { "BEP20": "1", "SS": "0.5" },
            "SWCT": { "BEP20": "2" }
        },
        "exchange": "0.996",
        "custom_exchange_commission": "0.995",
        "custom2_exchange_commission": "0.99",
        "replenishment": "2.3"
    })
}

pub(crate) fn sample_document() -> CommissionDocument {
    match CommissionDocument::from_json(sample_json()) {
        Ok(document) => document,
        Err(e) => panic!("sample document must parse: {}", e),
    }
}

/// Sample document with the `transfer.USD.SW` leaf and exchange replaced.
pub(crate) fn document_with(usd_sw: rust_decimal::Decimal, exchange: rust_decimal::Decimal) -> CommissionDocument {
    let mut document = sample_document();
    document.transfer.usd.sw = Some(usd_sw);
    document.exchange = Some(exchange);
    document
}

#[test]
fn test_sample_document_is_valid() {
    let document = sample_document();
    assert!(document.validate().is_ok());
    assert_eq!(document.transfer.usdt.trc20, Some(dec!(1)));
}
