//! # Fatoora
//!
//! Issue e-invoices that are valid, chained and hashed the same way every
//! time.
//!
//! ## Overview
//!
//! An [`Engine`] issues invoices for one company:
//!
//! - **Validation**: every business-rule violation is reported at once
//! - **Serialization**: UBL 2.1 XML in the exact element order required
//! - **Hashing**: SHA-256 over the exclusive canonical form
//! - **Chaining**: each invoice carries its counter (ICV) and the hash of its
//!   predecessor (PIH)
//! - **QR**: a TLV payload, optionally signed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::{NaiveDate, NaiveTime};
//! use fatoora::{CompanyProfile, Engine, EngineConfig, InvoiceRequest, LineRequest};
//! use fatoora::core::{Address, IdScheme, InvoiceType, Party};
//! use fatoora::store::MemoryChainStore;
//! use rust_decimal::Decimal;
//!
//! async fn example() {
//!     let seller = Party::new("ACME", Address::default())
//!         .with_vat_number("310123456700003")
//!         .with_identification(IdScheme::Crn, "2341682066");
//!
//!     let engine = Engine::new(
//!         CompanyProfile::new("acme", seller),
//!         MemoryChainStore::new(),
//!         EngineConfig::default(),
//!     );
//!
//!     let request = InvoiceRequest::new(
//!         InvoiceType::Simplified,
//!         "INV-0001",
//!         NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!         NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
//!     )
//!     .line(LineRequest::new("Widget", Decimal::from(2), Decimal::from(100)));
//!
//!     let issued = engine.issue(request).await.unwrap();
//!     println!("ICV {} hash {}", issued.icv(), issued.hash());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `fatoora::core` - Model, validation, serialization, hashing, QR
//! - `fatoora::store` - Chain persistence

pub mod config;
pub mod engine;
pub mod error;
pub mod request;

// Re-export component crates
pub use fatoora_core as core;
pub use fatoora_store as store;

// Re-export main types for convenience
pub use config::{CompanyProfile, EngineConfig};
pub use engine::{Engine, IssuedInvoice};
pub use error::{EngineError, Result};
pub use request::{InvoiceRequest, LineRequest};

// Re-export commonly used core types
pub use fatoora_core::{
    audit_chain, AssembledInvoice, ChainHealth, ChainKey, ChainState, InvoiceHash, InvoiceType,
    Party, QrPayload, ValidationError, ViolationCode,
};
