//! Tag-length-value encoding for the QR payload.
//!
//! Each field is `[tag: u8][len: u8][value]`. A one-byte length caps values
//! at 255 bytes; longer values are an encoding failure, never truncated.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::CoreError;

/// Maximum value length representable by the one-byte length prefix.
pub const MAX_VALUE_LEN: usize = 255;

/// QR payload tags.
pub mod tags {
    pub const SELLER_NAME: u8 = 1;
    pub const VAT_NUMBER: u8 = 2;
    pub const TIMESTAMP: u8 = 3;
    pub const TOTAL_WITH_VAT: u8 = 4;
    pub const VAT_TOTAL: u8 = 5;
    pub const INVOICE_HASH: u8 = 6;
    pub const SIGNATURE: u8 = 7;
    pub const PUBLIC_KEY: u8 = 8;
}

/// A single TLV field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvField {
    pub tag: u8,
    pub value: Vec<u8>,
}

impl TlvField {
    pub fn new(tag: u8, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

/// Encode fields in the given order.
pub fn encode(fields: &[TlvField]) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::with_capacity(fields.iter().map(|f| f.value.len() + 2).sum());
    for field in fields {
        if field.value.len() > MAX_VALUE_LEN {
            return Err(CoreError::TlvValueTooLong {
                tag: field.tag,
                len: field.value.len(),
            });
        }
        buf.push(field.tag);
        buf.push(field.value.len() as u8);
        buf.extend_from_slice(&field.value);
    }
    Ok(buf)
}

/// Decode a TLV stream back into its ordered fields.
pub fn decode(bytes: &[u8]) -> Result<Vec<TlvField>, CoreError> {
    let mut fields = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        if offset + 2 > bytes.len() {
            return Err(CoreError::TlvTruncated { offset });
        }
        let tag = bytes[offset];
        let len = bytes[offset + 1] as usize;
        let start = offset + 2;
        let end = start + len;
        if end > bytes.len() {
            return Err(CoreError::TlvTruncated { offset });
        }
        fields.push(TlvField::new(tag, &bytes[start..end]));
        offset = end;
    }

    Ok(fields)
}

/// The QR payload of a simplified or standard invoice.
///
/// Tags 1 through 5 are always emitted. Tags 6 through 8 are emitted only
/// when present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QrPayload {
    pub seller_name: String,
    pub vat_number: String,
    /// `YYYY-MM-DDTHH:MM:SS`.
    pub timestamp: String,
    pub total_with_vat: String,
    pub vat_total: String,
    /// Base64 invoice hash text.
    pub invoice_hash: Option<String>,
    /// Base64 signature text.
    pub signature: Option<String>,
    /// Raw public key bytes.
    pub public_key: Option<Vec<u8>>,
}

impl QrPayload {
    /// The ordered TLV fields of this payload.
    pub fn fields(&self) -> Vec<TlvField> {
        let mut fields = vec![
            TlvField::new(tags::SELLER_NAME, self.seller_name.as_bytes()),
            TlvField::new(tags::VAT_NUMBER, self.vat_number.as_bytes()),
            TlvField::new(tags::TIMESTAMP, self.timestamp.as_bytes()),
            TlvField::new(tags::TOTAL_WITH_VAT, self.total_with_vat.as_bytes()),
            TlvField::new(tags::VAT_TOTAL, self.vat_total.as_bytes()),
        ];
        if let Some(hash) = self.invoice_hash.as_deref().filter(|s| !s.is_empty()) {
            fields.push(TlvField::new(tags::INVOICE_HASH, hash.as_bytes()));
        }
        if let Some(sig) = self.signature.as_deref().filter(|s| !s.is_empty()) {
            fields.push(TlvField::new(tags::SIGNATURE, sig.as_bytes()));
        }
        if let Some(key) = self.public_key.as_deref().filter(|k| !k.is_empty()) {
            fields.push(TlvField::new(tags::PUBLIC_KEY, key));
        }
        fields
    }

    /// Encode to TLV bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        encode(&self.fields())
    }

    /// Encode to the base64 string placed in the QR code.
    pub fn to_base64(&self) -> Result<String, CoreError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Decode a base64 QR string.
    ///
    /// Unknown tags are ignored. Text tags must be UTF-8.
    pub fn from_base64(s: &str) -> Result<Self, CoreError> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| CoreError::EncodingError(format!("QR payload is not base64: {e}")))?;

        let mut payload = QrPayload::default();
        for field in decode(&bytes)? {
            match field.tag {
                tags::SELLER_NAME => payload.seller_name = utf8(field)?,
                tags::VAT_NUMBER => payload.vat_number = utf8(field)?,
                tags::TIMESTAMP => payload.timestamp = utf8(field)?,
                tags::TOTAL_WITH_VAT => payload.total_with_vat = utf8(field)?,
                tags::VAT_TOTAL => payload.vat_total = utf8(field)?,
                tags::INVOICE_HASH => payload.invoice_hash = Some(utf8(field)?),
                tags::SIGNATURE => payload.signature = Some(utf8(field)?),
                tags::PUBLIC_KEY => payload.public_key = Some(field.value),
                _ => {}
            }
        }
        Ok(payload)
    }
}

fn utf8(field: TlvField) -> Result<String, CoreError> {
    String::from_utf8(field.value)
        .map_err(|e| CoreError::EncodingError(format!("tag {} is not UTF-8: {e}", field.tag)))
}
