//! Proptest generators for property-based testing.

use proptest::prelude::*;
use rust_decimal::Decimal;

use fatoora_core::tlv::TlvField;
use fatoora_core::{InvoiceDraft, InvoiceHash, InvoiceType, LineItem, VatCategory};

use crate::fixtures::widget_draft;

/// Generate a random InvoiceHash.
pub fn invoice_hash() -> impl Strategy<Value = InvoiceHash> {
    any::<[u8; 32]>().prop_map(InvoiceHash::from_bytes)
}

/// A positive quantity with up to three decimals.
pub fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000).prop_map(|milli| Decimal::new(milli, 3))
}

/// A non-negative unit price with up to four decimals.
pub fn unit_price() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000_000).prop_map(|v| Decimal::new(v, 4))
}

/// One of the rates in use, plus arbitrary ones within 0..=100.
pub fn vat_rate() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::from(15)),
        Just(Decimal::from(5)),
        Just(Decimal::ZERO),
        (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2)),
    ]
}

pub fn vat_category() -> impl Strategy<Value = VatCategory> {
    prop_oneof![
        Just(VatCategory::Standard),
        Just(VatCategory::ZeroRated),
        Just(VatCategory::Exempt),
        Just(VatCategory::OutOfScope),
    ]
}

pub fn invoice_type() -> impl Strategy<Value = InvoiceType> {
    prop_oneof![Just(InvoiceType::Standard), Just(InvoiceType::Simplified)]
}

/// Item names, including Arabic text and XML-special characters.
pub fn item_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z][A-Za-z0-9 ]{0,30}".prop_map(String::from),
        Just("قهوة عربية".to_string()),
        Just("Nuts & Bolts <M8>".to_string()),
        Just("\"Quoted\" 'item'".to_string()),
    ]
}

/// A valid invoice line.
pub fn line_item() -> impl Strategy<Value = LineItem> {
    (item_name(), quantity(), unit_price(), vat_rate(), vat_category()).prop_map(
        |(name, qty, price, rate, category)| {
            LineItem::new(name, qty, price, rate).with_category(category)
        },
    )
}

/// A valid draft at an arbitrary chain position.
pub fn draft() -> impl Strategy<Value = InvoiceDraft> {
    (
        invoice_type(),
        prop::collection::vec(line_item(), 1..8),
        1u64..=1_000_000,
        invoice_hash(),
    )
        .prop_map(|(kind, lines, icv, prev)| {
            let mut draft = widget_draft(kind);
            draft.lines = lines;
            let previous = if icv == 1 { None } else { Some(prev) };
            draft.chained(icv, previous)
        })
}

/// Generate TLV fields with values that fit the one-byte length.
pub fn tlv_fields() -> impl Strategy<Value = Vec<TlvField>> {
    prop::collection::vec(
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..=255))
            .prop_map(|(tag, value)| TlvField::new(tag, value)),
        0..10,
    )
}
