//! Shared unit-test data.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::model::{Address, IdScheme, InvoiceDraft, InvoiceType, LineItem, Party};
use crate::validation::validate;
use crate::ValidatedInvoice;

pub(crate) fn address() -> Address {
    Address {
        street: "King Fahd Rd".into(),
        building_number: "1234".into(),
        city: "Riyadh".into(),
        postal_code: "11564".into(),
        district: Some("Olaya".into()),
        country: "SA".into(),
    }
}

pub(crate) fn seller() -> Party {
    Party::new("ACME", address())
        .with_vat_number("310123456700003")
        .with_identification(IdScheme::Crn, "2341682066")
}

pub(crate) fn buyer() -> Party {
    Party::new(
        "Buyer Co",
        Address {
            street: "Prince Sultan St".into(),
            building_number: "5678".into(),
            city: "Jeddah".into(),
            postal_code: "23521".into(),
            district: Some("Al Rawdah".into()),
            country: "SA".into(),
        },
    )
    .with_vat_number("300000000000003")
}

pub(crate) fn draft(kind: InvoiceType) -> InvoiceDraft {
    let draft = InvoiceDraft::new(
        kind,
        "INV-0001",
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        seller(),
    )
    .uuid(Uuid::from_u128(0x8d8ac610_566d_4ef0_9c22_186b2a5ed793))
    .line(LineItem::new("Widget", dec!(2), dec!(100), dec!(15)));

    match kind {
        InvoiceType::Standard => draft.buyer(buyer()),
        InvoiceType::Simplified => draft,
    }
}

pub(crate) fn validated(kind: InvoiceType) -> ValidatedInvoice {
    validate(draft(kind)).unwrap()
}
