//! Signing seam for QR tags 7 and 8.
//!
//! The assembler never holds key material. It hands the 32 raw hash bytes to
//! a [`SigningCapability`] and embeds whatever signature and public key come
//! back. Failures are surfaced, never retried.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;

use crate::error::CoreError;

/// An external signer.
pub trait SigningCapability: Send + Sync {
    /// Sign a payload.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, CoreError>;

    /// The public key matching the signatures produced, as raw bytes.
    fn public_key(&self) -> Vec<u8>;
}

/// An in-process Ed25519 signer.
///
/// Wraps ed25519-dalek's `SigningKey`.
#[derive(Clone)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The 32-byte public key.
    pub fn verifying_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl SigningCapability for Ed25519Signer {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, CoreError> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }

    fn public_key(&self) -> Vec<u8> {
        self.verifying_key().to_vec()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signer({}...)", &hex::encode(self.verifying_key())[..16])
    }
}

/// Verify an Ed25519 signature given raw key and signature bytes.
pub fn verify_ed25519(public_key: &[u8], payload: &[u8], signature: &[u8]) -> Result<(), CoreError> {
    let key: [u8; 32] = public_key
        .try_into()
        .map_err(|_| CoreError::Signing(format!("public key is {} bytes", public_key.len())))?;
    let key = VerifyingKey::from_bytes(&key)
        .map_err(|e| CoreError::Signing(format!("invalid public key: {e}")))?;
    let sig = Signature::from_slice(signature)
        .map_err(|e| CoreError::Signing(format!("invalid signature: {e}")))?;
    key.verify(payload, &sig)
        .map_err(|e| CoreError::Signing(format!("signature mismatch: {e}")))
}
