//! SHA-256 invoice hashes.
//!
//! Only canonical bytes are ever hashed. The digest is exposed as lowercase
//! hex and as standard padded base64; the latter is what the document's PIH
//! block and QR tag 6 carry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte SHA-256 digest of an invoice's canonical form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvoiceHash(pub [u8; 32]);

impl InvoiceHash {
    /// Compute the SHA-256 hash of canonical bytes.
    pub fn compute(canonical: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Convert to padded base64 (44 chars).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from a 64-char hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHash(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Parse from base64 that decodes to exactly 32 bytes.
    pub fn from_base64(s: &str) -> Result<Self, CoreError> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| CoreError::InvalidHash(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Parse either accepted textual form.
    ///
    /// A 64-char hex string is tried first, then base64. Anything that is
    /// neither is rejected rather than passed through.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Self::from_hex(s);
        }
        Self::from_base64(s).map_err(|_| {
            CoreError::InvalidHash(format!(
                "expected 64 hex chars or base64 of 32 bytes, got {:?}",
                truncate(s, 80)
            ))
        })
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::InvalidHash(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// The zero hash. Stands in as PIH for the first document of a chain.
    pub const ZERO: Self = Self([0u8; 32]);
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl fmt::Debug for InvoiceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvoiceHash({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for InvoiceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for InvoiceHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for InvoiceHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for InvoiceHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for InvoiceHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_B64: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn test_known_digest() {
        let h = InvoiceHash::compute(b"abc");
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(h.to_base64(), "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=");
    }

    #[test]
    fn test_zero_hash_base64() {
        assert_eq!(InvoiceHash::ZERO.to_base64(), ZERO_B64);
    }

    #[test]
    fn test_parse_accepts_hex_and_base64() {
        let h = InvoiceHash::compute(b"invoice");
        assert_eq!(InvoiceHash::parse(&h.to_hex()).unwrap(), h);
        assert_eq!(InvoiceHash::parse(&h.to_base64()).unwrap(), h);
        assert_eq!(InvoiceHash::parse(&format!("  {}\n", h.to_hex())).unwrap(), h);
        assert_eq!(InvoiceHash::parse(&h.to_hex().to_uppercase()).unwrap(), h);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(InvoiceHash::parse("").is_err());
        assert!(InvoiceHash::parse("not a hash").is_err());
        // Valid base64, wrong length.
        assert!(InvoiceHash::parse("AAAA").is_err());
        // 63 hex chars.
        assert!(InvoiceHash::parse(&"a".repeat(63)).is_err());
    }

    #[test]
    fn test_serde_uses_hex() {
        let h = InvoiceHash::compute(b"x");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: InvoiceHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
