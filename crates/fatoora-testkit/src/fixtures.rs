//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use fatoora::{CompanyProfile, Engine, EngineConfig, InvoiceRequest, LineRequest};
use fatoora_core::{
    Address, Ed25519Signer, IdScheme, InvoiceDraft, InvoiceType, LineItem, Party,
};
use fatoora_store::MemoryChainStore;

/// The reference seller: ACME in Riyadh.
pub fn acme_seller() -> Party {
    Party::new(
        "ACME",
        Address {
            street: "King Fahd Rd".into(),
            building_number: "1234".into(),
            city: "Riyadh".into(),
            postal_code: "11564".into(),
            district: Some("Olaya".into()),
            country: "SA".into(),
        },
    )
    .with_vat_number("310123456700003")
    .with_identification(IdScheme::Crn, "2341682066")
}

/// A VAT-registered buyer in Jeddah.
pub fn domestic_buyer() -> Party {
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

/// A buyer outside the kingdom, identified by a tax id instead of a VAT number.
pub fn foreign_buyer() -> Party {
    Party::new(
        "Overseas LLC",
        Address {
            street: "Sheikh Zayed Rd".into(),
            building_number: "".into(),
            city: "Dubai".into(),
            postal_code: "00000".into(),
            district: None,
            country: "AE".into(),
        },
    )
    .with_identification(IdScheme::Tin, "100234567800003")
}

/// 2 x 100.00 at 15%: net 200.00, VAT 30.00, gross 230.00.
pub fn widget_line() -> LineItem {
    LineItem::new("Widget", Decimal::from(2), Decimal::from(100), Decimal::from(15))
}

pub fn issue_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}

pub fn issue_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 30, 0).unwrap_or_default()
}

/// A deterministic UUID for invoice `n`.
pub fn invoice_uuid(n: u32) -> Uuid {
    Uuid::from_u128(0x8d8ac610_566d_4ef0_9c22_000000000000 | n as u128)
}

/// The widget draft, with a buyer when the type needs one.
pub fn widget_draft(kind: InvoiceType) -> InvoiceDraft {
    let draft = InvoiceDraft::new(kind, "INV-0001", issue_date(), issue_time(), acme_seller())
        .uuid(invoice_uuid(1))
        .line(widget_line());
    match kind {
        InvoiceType::Standard => draft.buyer(domestic_buyer()),
        InvoiceType::Simplified => draft,
    }
}

/// The widget request for invoice `n`.
pub fn widget_request(kind: InvoiceType, n: u32) -> InvoiceRequest {
    let request = InvoiceRequest::new(kind, format!("INV-{n:04}"), issue_date(), issue_time())
        .uuid(invoice_uuid(n))
        .line(LineRequest::new("Widget", Decimal::from(2), Decimal::from(100)));
    match kind {
        InvoiceType::Standard => request.buyer(domestic_buyer()),
        InvoiceType::Simplified => request,
    }
}

/// A test fixture with a shared memory store and a deterministic signer.
pub struct TestFixture {
    pub store: Arc<MemoryChainStore>,
    pub signer: Ed25519Signer,
}

impl TestFixture {
    /// Create a new test fixture with a random signer.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryChainStore::new()),
            signer: Ed25519Signer::generate(),
        }
    }

    /// Create with a deterministic signer from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            store: Arc::new(MemoryChainStore::new()),
            signer: Ed25519Signer::from_seed(&seed),
        }
    }

    /// An unsigned engine for ACME on the given chain.
    pub fn engine(&self, chain: &str) -> Engine<MemoryChainStore> {
        Engine::with_shared_store(
            CompanyProfile::new(chain, acme_seller()),
            self.store.clone(),
            EngineConfig::default(),
        )
    }

    /// An engine that signs its QR payloads with the fixture's signer.
    pub fn signing_engine(&self, chain: &str) -> Engine<MemoryChainStore> {
        self.engine(chain).with_signer(self.signer.clone())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatoora_core::validate;

    #[test]
    fn test_fixture_drafts_validate() {
        validate(widget_draft(InvoiceType::Simplified)).unwrap();
        validate(widget_draft(InvoiceType::Standard)).unwrap();
        validate(widget_draft(InvoiceType::Standard).buyer(foreign_buyer())).unwrap();
    }

    #[test]
    fn test_invoice_uuid_distinct() {
        assert_ne!(invoice_uuid(1), invoice_uuid(2));
        assert_eq!(invoice_uuid(3), invoice_uuid(3));
    }

    #[tokio::test]
    async fn test_engines_share_store() {
        let fixture = TestFixture::with_seed([1; 32]);
        fixture
            .engine("acme")
            .issue(widget_request(InvoiceType::Simplified, 1))
            .await
            .unwrap();

        let again = fixture.signing_engine("acme");
        assert_eq!(again.chain_state().await.unwrap().icv(), 2);
    }
}
