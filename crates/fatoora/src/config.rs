//! Engine configuration and the issuing company's profile.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fatoora_core::model::MANDATED_CURRENCY;
use fatoora_core::{ChainKey, Party};

/// Configuration for the Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Document currency of every issued invoice.
    pub currency: String,
    /// VAT rate for lines that do not name one.
    pub default_vat_rate: Decimal,
    /// Whether issued invoices carry a QR payload.
    pub emit_qr: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: MANDATED_CURRENCY.to_string(),
            default_vat_rate: Decimal::from(15),
            emit_qr: true,
        }
    }
}

/// The company an engine issues for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// The chain all of this company's invoices extend.
    pub key: ChainKey,
    pub seller: Party,
}

impl CompanyProfile {
    pub fn new(key: impl Into<ChainKey>, seller: Party) -> Self {
        Self {
            key: key.into(),
            seller,
        }
    }
}
