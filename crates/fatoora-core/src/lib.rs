//! # Fatoora Core
//!
//! Pure primitives for e-invoices: the document model, business-rule
//! validation, UBL serialization, canonicalization, hashing and QR payloads.
//!
//! This crate contains no I/O, no storage, no async. Everything is a
//! deterministic function of an immutable validated model, except
//! [`ChainState`], which is plain data advanced through `&mut self`.
//!
//! ## Pipeline
//!
//! ```text
//! InvoiceDraft ─validate─▶ ValidatedInvoice ─serialize─▶ Element
//!                                                      │
//!                                   canonicalize ◀─────┘
//!                                        │
//!                            InvoiceHash::compute ─▶ QrPayload
//! ```
//!
//! [`assemble`] runs the whole pipeline and returns an [`AssembledInvoice`].
//!
//! ## Key Types
//!
//! - [`InvoiceDraft`] - Caller-supplied invoice data
//! - [`ValidatedInvoice`] - A draft that passed every business rule
//! - [`InvoiceHash`] - SHA-256 of the canonical form
//! - [`ChainState`] - ICV and PIH of the next document in a chain
//! - [`QrPayload`] - TLV fields of the QR code

pub mod assembler;
pub mod canonical;
pub mod chain;
pub mod error;
pub mod format;
pub mod hash;
pub mod model;
pub mod serialize;
pub mod signing;
pub mod tlv;
pub mod validation;
pub mod xml;

#[cfg(test)]
mod fixtures;

pub use assembler::{assemble, assemble_validated, AssembledInvoice, QrOptions};
pub use canonical::{canonicalize, canonicalize_bytes};
pub use chain::{audit_chain, ChainHealth, ChainKey, ChainLink, ChainSnapshot, ChainState};
pub use error::{AssemblyError, CoreError, ValidationError, Violation, ViolationCode};
pub use hash::InvoiceHash;
pub use model::{
    Address, DocumentTotals, IdScheme, InvoiceDraft, InvoiceType, LineItem, LineTotals, Party,
    PartyId, TaxSubtotal, TypeProfile, ValidatedInvoice, VatCategory,
};
pub use serialize::serialize;
pub use signing::{Ed25519Signer, SigningCapability};
pub use tlv::QrPayload;
pub use validation::validate;
pub use xml::{Element, Node};
