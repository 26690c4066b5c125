//! Golden test vectors for deterministic verification.
//!
//! Invoice vectors pin the per-line rounding and document totals. QR vectors
//! pin the exact TLV bytes, so any implementation can check itself against
//! the same base64 strings.

use rust_decimal::Decimal;

use fatoora_core::format::money;
use fatoora_core::{
    assemble, AssembledInvoice, AssemblyError, CoreError, InvoiceDraft, InvoiceHash, InvoiceType,
    LineItem, QrOptions, QrPayload,
};

use crate::fixtures::widget_draft;

/// One line of an invoice vector: quantity, unit price, VAT rate.
pub type VectorLine = (&'static str, &'static str, &'static str);

/// A golden invoice vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub kind: InvoiceType,
    pub lines: &'static [VectorLine],
    /// Expected `LineExtensionAmount` of the document.
    pub expected_net: &'static str,
    /// Expected document `TaxAmount`.
    pub expected_vat: &'static str,
    /// Expected `PayableAmount`.
    pub expected_payable: &'static str,
}

/// A golden QR vector: payload fields and the exact base64 they encode to.
#[derive(Debug, Clone)]
pub struct QrVector {
    pub name: &'static str,
    pub seller_name: &'static str,
    pub vat_number: &'static str,
    pub timestamp: &'static str,
    pub total_with_vat: &'static str,
    pub vat_total: &'static str,
    pub expected_base64: &'static str,
}

impl QrVector {
    pub fn payload(&self) -> QrPayload {
        QrPayload {
            seller_name: self.seller_name.to_string(),
            vat_number: self.vat_number.to_string(),
            timestamp: self.timestamp.to_string(),
            total_with_vat: self.total_with_vat.to_string(),
            vat_total: self.vat_total.to_string(),
            ..Default::default()
        }
    }
}

/// Base64 of 32 zero bytes: the PIH of the first invoice on a chain.
pub const ZERO_PIH_BASE64: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Get all golden invoice vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "widget: 2 x 100 at 15%",
            kind: InvoiceType::Simplified,
            lines: &[("2", "100", "15")],
            expected_net: "200.00",
            expected_vat: "30.00",
            expected_payable: "230.00",
        },
        GoldenVector {
            name: "net midpoint rounds away from zero",
            kind: InvoiceType::Simplified,
            lines: &[("3", "33.335", "15")],
            expected_net: "100.01",
            expected_vat: "15.00",
            expected_payable: "115.01",
        },
        GoldenVector {
            name: "fractional quantity",
            kind: InvoiceType::Simplified,
            lines: &[("0.5", "19.99", "15")],
            expected_net: "10.00",
            expected_vat: "1.50",
            expected_payable: "11.50",
        },
        GoldenVector {
            name: "mixed rates",
            kind: InvoiceType::Standard,
            lines: &[("1", "99.99", "15"), ("4", "12.5", "5"), ("1", "50", "0")],
            expected_net: "199.99",
            expected_vat: "17.50",
            expected_payable: "217.49",
        },
        GoldenVector {
            // Rounded per line, so the two half-cent taxes never add up.
            name: "VAT is rounded per line",
            kind: InvoiceType::Simplified,
            lines: &[("1", "0.03", "15"), ("1", "0.03", "15")],
            expected_net: "0.06",
            expected_vat: "0.00",
            expected_payable: "0.06",
        },
    ]
}

/// Get all golden QR vectors.
pub fn qr_vectors() -> Vec<QrVector> {
    vec![
        QrVector {
            name: "widget invoice from ACME",
            seller_name: "ACME",
            vat_number: "310123456700003",
            timestamp: "2024-01-15T10:30:00",
            total_with_vat: "230.00",
            vat_total: "30.00",
            expected_base64: "AQRBQ01FAg8zMTAxMjM0NTY3MDAwMDMDEzIwMjQtMDEtMTVUMTA6MzA6MDAEBjIzMC4wMAUFMzAuMDA=",
        },
        QrVector {
            name: "published reference payload",
            seller_name: "Bobs Records",
            vat_number: "310122393500003",
            timestamp: "2022-04-25T15:30:00Z",
            total_with_vat: "1000.00",
            vat_total: "150.00",
            expected_base64: "AQxCb2JzIFJlY29yZHMCDzMxMDEyMjM5MzUwMDAwMwMUMjAyMi0wNC0yNVQxNTozMDowMFoEBzEwMDAuMDAFBjE1MC4wMA==",
        },
    ]
}

/// Build the first-on-chain draft of a golden vector.
///
/// Fails only if a vector line is not a decimal literal.
pub fn draft_from_vector(vector: &GoldenVector) -> Result<InvoiceDraft, rust_decimal::Error> {
    let mut draft = widget_draft(vector.kind);
    draft.lines = vector
        .lines
        .iter()
        .enumerate()
        .map(|(i, (qty, price, rate))| {
            Ok(LineItem::new(
                format!("Item {}", i + 1),
                qty.parse::<Decimal>()?,
                price.parse::<Decimal>()?,
                rate.parse::<Decimal>()?,
            ))
        })
        .collect::<Result<_, rust_decimal::Error>>()?;
    Ok(draft.chained(1, None))
}

/// Assemble a golden vector with an unsigned QR.
pub fn assemble_vector(vector: &GoldenVector) -> Result<AssembledInvoice, AssemblyError> {
    let draft = draft_from_vector(vector)
        .map_err(|e| AssemblyError::from(CoreError::EncodingError(e.to_string())))?;
    assemble(draft, QrOptions::Unsigned)
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, actual)` per vector, QR vectors included.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let invoices = all_vectors().into_iter().map(|v| {
        let (matches, actual) = match assemble_vector(&v) {
            Ok(doc) => {
                let actual = format!(
                    "{} / {} / {}",
                    money(doc.totals.line_extension),
                    money(doc.totals.vat),
                    money(doc.totals.payable)
                );
                let expected = format!(
                    "{} / {} / {}",
                    v.expected_net, v.expected_vat, v.expected_payable
                );
                (actual == expected && first_pih_is_zero(&doc), actual)
            }
            Err(e) => (false, e.to_string()),
        };
        (v.name.to_string(), matches, actual)
    });

    let qrs = qr_vectors().into_iter().map(|v| {
        let actual = v.payload().to_base64().unwrap_or_else(|e| e.to_string());
        (v.name.to_string(), actual == v.expected_base64, actual)
    });

    invoices.chain(qrs).collect()
}

fn first_pih_is_zero(doc: &AssembledInvoice) -> bool {
    doc.invoice.pih() == InvoiceHash::ZERO
        && String::from_utf8_lossy(&doc.xml).contains(ZERO_PIH_BASE64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatoora_core::tlv::{decode, tags};

    #[test]
    fn test_all_vectors_pass() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "vector '{name}' produced {actual}");
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let a = assemble_vector(&vector).unwrap();
            let b = assemble_vector(&vector).unwrap();
            assert_eq!(a.hash, b.hash, "vector '{}' hashed differently", vector.name);
            assert_eq!(a.canonical, b.canonical);
        }
    }

    #[test]
    fn test_vector_qr_carries_totals() {
        for vector in all_vectors() {
            let doc = assemble_vector(&vector).unwrap();
            let qr = QrPayload::from_base64(doc.qr.as_deref().unwrap()).unwrap();
            assert_eq!(qr.total_with_vat, vector.expected_payable);
            assert_eq!(qr.vat_total, vector.expected_vat);
            assert_eq!(qr.invoice_hash, Some(doc.hash_base64()));
        }
    }

    #[test]
    fn test_qr_vector_layout() {
        let vector = &qr_vectors()[0];
        let bytes = vector.payload().to_bytes().unwrap();
        assert_eq!(&bytes[..6], &[tags::SELLER_NAME, 4, b'A', b'C', b'M', b'E']);

        let fields = decode(&bytes).unwrap();
        let tags: Vec<u8> = fields.iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_qr_vectors_decode_back() {
        for vector in qr_vectors() {
            let decoded = QrPayload::from_base64(vector.expected_base64).unwrap();
            assert_eq!(decoded, vector.payload(), "vector '{}'", vector.name);
        }
    }

    #[test]
    fn test_different_lines_different_hashes() {
        let vectors = all_vectors();
        let a = assemble_vector(&vectors[0]).unwrap();
        let b = assemble_vector(&vectors[1]).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_zero_pih_constant() {
        assert_eq!(InvoiceHash::ZERO.to_base64(), ZERO_PIH_BASE64);
    }
}
