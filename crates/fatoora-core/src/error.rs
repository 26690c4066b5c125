//! Error types for Fatoora core.
//!
//! Two failure kinds exist. [`ValidationError`] carries every business-rule
//! violation found in a draft and is raised before any serialization work.
//! [`CoreError`] is a single structural or encoding failure that aborts the
//! document being assembled.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural and encoding errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("required field {field} is empty")]
    EmptyRequiredField { field: String },

    #[error("TLV value for tag {tag} is {len} bytes, maximum is 255")]
    TlvValueTooLong { tag: u8, len: usize },

    #[error("TLV stream truncated at offset {offset}")]
    TlvTruncated { offset: usize },

    #[error("invalid invoice hash: {0}")]
    InvalidHash(String),

    #[error("invalid chain state: {0}")]
    InvalidChainState(String),

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

impl CoreError {
    pub(crate) fn empty(field: impl Into<String>) -> Self {
        CoreError::EmptyRequiredField {
            field: field.into(),
        }
    }
}

/// Machine-readable violation codes.
///
/// Codes mirror the business-term identifiers of the e-invoicing data
/// dictionary so that callers can map them onto form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationCode {
    // Document level
    InvoiceNumber,
    Currency,
    TaxCurrency,
    CounterValue,

    // Seller
    SellerName,
    SellerVat,
    SellerRegistration,
    SellerStreet,
    SellerCity,
    SellerPostalZone,
    SellerDistrict,
    SellerCountry,
    SellerBuildingNumber,

    // Buyer
    BuyerMissing,
    BuyerName,
    BuyerStreet,
    BuyerCity,
    BuyerPostalZone,
    BuyerDistrict,
    BuyerCountry,
    BuyerBuildingNumber,
    BuyerIdentification,

    // Lines
    NoLines,
    LineQuantity,
    LinePrice,
    LineVatRate,
    LineName,
    LineAmount,
    DocumentAmount,
}

impl ViolationCode {
    /// The stable string form of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvoiceNumber => "BT-1",
            Self::Currency => "BT-5",
            Self::TaxCurrency => "BT-6",
            Self::CounterValue => "KSA-16",
            Self::SellerName => "BT-27",
            Self::SellerVat => "BT-31",
            Self::SellerRegistration => "BT-29",
            Self::SellerStreet => "BT-35",
            Self::SellerCity => "BT-37",
            Self::SellerPostalZone => "BT-38",
            Self::SellerDistrict => "KSA-3",
            Self::SellerCountry => "BT-40",
            Self::SellerBuildingNumber => "BR-KSA-37",
            Self::BuyerMissing => "BG-7",
            Self::BuyerName => "BT-44",
            Self::BuyerStreet => "BT-50",
            Self::BuyerCity => "BT-52",
            Self::BuyerPostalZone => "BT-53",
            Self::BuyerDistrict => "KSA-4",
            Self::BuyerCountry => "BT-55",
            Self::BuyerBuildingNumber => "BR-KSA-63",
            Self::BuyerIdentification => "BT-46",
            Self::NoLines => "BG-25",
            Self::LineQuantity => "BT-129",
            Self::LinePrice => "BT-146",
            Self::LineVatRate => "BT-152",
            Self::LineName => "BT-153",
            Self::LineAmount => "BT-131",
            Self::DocumentAmount => "BT-106",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single business-rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
    /// Dotted path of the offending field, e.g. `InvoiceLine[1].InvoicedQuantity`.
    pub field: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

/// Every violation found in one draft, raised as a single failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invoice has {} violation(s): {}", .violations.len(), join(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Codes of all violations, in the order they were found.
    pub fn codes(&self) -> Vec<ViolationCode> {
        self.violations.iter().map(|v| v.code).collect()
    }

    /// Whether a violation with the given code was raised.
    pub fn contains(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of the assembly pipeline.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Structural(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message_lists_all() {
        let err = ValidationError {
            violations: vec![
                Violation {
                    code: ViolationCode::SellerVat,
                    message: "seller VAT number is required".into(),
                    field: "Seller.VAT".into(),
                },
                Violation {
                    code: ViolationCode::LineQuantity,
                    message: "quantity must be greater than zero".into(),
                    field: "InvoiceLine[1].InvoicedQuantity".into(),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.starts_with("invoice has 2 violation(s)"));
        assert!(msg.contains("[BT-31] Seller.VAT"));
        assert!(msg.contains("[BT-129] InvoiceLine[1].InvoicedQuantity"));
        assert!(err.contains(ViolationCode::LineQuantity));
        assert!(!err.contains(ViolationCode::SellerName));
    }

    #[test]
    fn test_violation_code_serializes_by_variant() {
        let json = serde_json::to_string(&ViolationCode::SellerDistrict).unwrap();
        assert_eq!(json, "\"SellerDistrict\"");
        assert_eq!(ViolationCode::SellerDistrict.as_str(), "KSA-3");
    }
}
