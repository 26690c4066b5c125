//! Document assembly: validate, serialize, canonicalize, hash, build the QR.
//!
//! Every view of an [`AssembledInvoice`] is derived from one validated model,
//! so the XML, the hash and the QR payload always agree.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::canonical::canonicalize;
use crate::chain::ChainLink;
use crate::error::{AssemblyError, CoreError};
use crate::format::money;
use crate::hash::InvoiceHash;
use crate::model::{DocumentTotals, InvoiceDraft, ValidatedInvoice};
use crate::serialize::serialize;
use crate::signing::SigningCapability;
use crate::tlv::QrPayload;
use crate::validation::validate;
use crate::xml::Element;

/// Whether and how to build the QR payload.
#[derive(Clone, Copy, Default)]
pub enum QrOptions<'a> {
    /// No QR payload.
    Omit,
    /// Tags 1 through 6.
    #[default]
    Unsigned,
    /// Tags 1 through 8, signing the raw hash bytes.
    Signed(&'a dyn SigningCapability),
}

impl std::fmt::Debug for QrOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QrOptions::Omit => f.write_str("Omit"),
            QrOptions::Unsigned => f.write_str("Unsigned"),
            QrOptions::Signed(_) => f.write_str("Signed(..)"),
        }
    }
}

/// The derived views of one invoice.
#[derive(Debug, Clone)]
pub struct AssembledInvoice {
    /// The validated model everything was derived from.
    pub invoice: ValidatedInvoice,
    /// Document tree.
    pub tree: Element,
    /// Serialized XML with declaration and indentation.
    pub xml: Bytes,
    /// Canonical bytes; the hash input.
    pub canonical: Bytes,
    pub hash: InvoiceHash,
    pub totals: DocumentTotals,
    /// Base64 QR payload, unless omitted.
    pub qr: Option<String>,
}

impl AssembledInvoice {
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex()
    }

    pub fn hash_base64(&self) -> String {
        self.hash.to_base64()
    }

    /// The chain fields this document carries.
    pub fn chain_link(&self) -> ChainLink {
        ChainLink {
            icv: self.invoice.icv(),
            pih: self.invoice.pih(),
            hash: self.hash,
        }
    }
}

/// Validate a draft and assemble it.
///
/// Validation runs first; no serialization or hashing happens for a draft
/// with violations.
pub fn assemble(
    draft: InvoiceDraft,
    qr: QrOptions<'_>,
) -> Result<AssembledInvoice, AssemblyError> {
    let invoice = validate(draft)?;
    Ok(build(invoice, qr)?)
}

/// Assemble an already validated invoice.
pub fn assemble_validated(
    invoice: &ValidatedInvoice,
    qr: QrOptions<'_>,
) -> Result<AssembledInvoice, CoreError> {
    build(invoice.clone(), qr)
}

fn build(invoice: ValidatedInvoice, qr: QrOptions<'_>) -> Result<AssembledInvoice, CoreError> {
    let tree = serialize(&invoice)?;
    let xml = tree.to_bytes()?;
    let canonical = canonicalize(&tree)?;
    let hash = InvoiceHash::compute(&canonical);
    let totals = *invoice.totals();

    let qr = match qr {
        QrOptions::Omit => None,
        QrOptions::Unsigned => Some(qr_payload(&invoice, &hash).to_base64()?),
        QrOptions::Signed(signer) => {
            let mut payload = qr_payload(&invoice, &hash);
            let signature = signer.sign(hash.as_bytes())?;
            payload.signature = Some(STANDARD.encode(signature));
            payload.public_key = Some(signer.public_key());
            Some(payload.to_base64()?)
        }
    };

    Ok(AssembledInvoice {
        invoice,
        tree,
        xml: Bytes::from(xml),
        canonical: Bytes::from(canonical),
        hash,
        totals,
        qr,
    })
}

fn qr_payload(invoice: &ValidatedInvoice, hash: &InvoiceHash) -> QrPayload {
    let draft = invoice.draft();
    let seller = invoice.seller();
    QrPayload {
        seller_name: seller.name.trim().to_string(),
        vat_number: seller
            .vat()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
        timestamp: format!(
            "{}T{}",
            draft.issue_date.format("%Y-%m-%d"),
            draft.issue_time.format("%H:%M:%S")
        ),
        total_with_vat: money(invoice.totals().tax_inclusive),
        vat_total: money(invoice.totals().vat),
        invoice_hash: Some(hash.to_base64()),
        signature: None,
        public_key: None,
    }
}
