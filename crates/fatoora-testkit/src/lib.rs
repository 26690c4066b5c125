//! # Fatoora Testkit
//!
//! Testing utilities for Fatoora e-invoicing.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known invoices and QR payloads with expected outputs
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Reference parties, drafts and engines over a shared store
//!
//! ## Golden Vectors
//!
//! ```rust
//! use fatoora_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     println!("{name}: {actual} ({})", if matches { "ok" } else { "MISMATCH" });
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use fatoora_core::{assemble, QrOptions};
//! use fatoora_testkit::generators::draft;
//!
//! proptest! {
//!     #[test]
//!     fn hash_is_deterministic(d in draft()) {
//!         let a = assemble(d.clone(), QrOptions::Omit).unwrap();
//!         let b = assemble(d, QrOptions::Omit).unwrap();
//!         prop_assert_eq!(a.hash, b.hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use fatoora_core::InvoiceType;
//! use fatoora_testkit::fixtures::{widget_request, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let engine = fixture.engine("acme");
//! let issued = engine.issue(widget_request(InvoiceType::Simplified, 1)).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    acme_seller, domestic_buyer, foreign_buyer, widget_draft, widget_line, widget_request,
    TestFixture,
};
pub use generators::{draft, line_item};
pub use vectors::{all_vectors, qr_vectors, verify_all_vectors, GoldenVector, QrVector};
