//! Chain: the ordered run of invoices issued by one company.
//!
//! Each document carries its invoice counter value (ICV) and the hash of its
//! predecessor (PIH). [`ChainState`] is the explicit state object that hands
//! out the next position; it is plain data and takes `&mut self` to advance,
//! so exclusive access is enforced by whoever owns it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::hash::InvoiceHash;

/// Name of one invoice chain. One per company profile.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainKey(String);

impl ChainKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainKey({})", self.0)
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ChainKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Persisted form of a chain position.
///
/// Serializes as `{"icv": 3, "previousHash": "<hex>"}`. On input the hash may
/// be hex or base64; it is always written back as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    pub icv: u64,
    pub previous_hash: Option<String>,
}

/// Position of a chain: the ICV the next document gets, and its PIH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainState {
    icv: u64,
    previous_hash: Option<InvoiceHash>,
}

impl ChainState {
    /// A fresh chain: ICV 1, no predecessor.
    pub fn new() -> Self {
        Self {
            icv: 1,
            previous_hash: None,
        }
    }

    /// Rebuild from a snapshot.
    ///
    /// Fails on ICV 0 and on a malformed hash. ICV 1 must have no
    /// predecessor hash; every later ICV must have one.
    pub fn restore(snapshot: &ChainSnapshot) -> Result<Self, CoreError> {
        if snapshot.icv == 0 {
            return Err(CoreError::InvalidChainState(
                "invoice counter value starts at 1".into(),
            ));
        }

        let previous_hash = snapshot
            .previous_hash
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(InvoiceHash::parse)
            .transpose()?;

        if snapshot.icv == 1 && previous_hash.is_some() {
            return Err(CoreError::InvalidChainState(
                "ICV 1 cannot have a previous invoice hash".into(),
            ));
        }
        if snapshot.icv > 1 && previous_hash.is_none() {
            return Err(CoreError::InvalidChainState(format!(
                "ICV {} has no previous invoice hash",
                snapshot.icv
            )));
        }

        Ok(Self {
            icv: snapshot.icv,
            previous_hash,
        })
    }

    /// ICV of the next document.
    pub fn icv(&self) -> u64 {
        self.icv
    }

    /// Hash of the most recently issued document, if any.
    pub fn previous_hash(&self) -> Option<InvoiceHash> {
        self.previous_hash
    }

    /// PIH of the next document: the zero hash for the first one.
    pub fn pih(&self) -> InvoiceHash {
        self.previous_hash.unwrap_or(InvoiceHash::ZERO)
    }

    /// Whether no document has been issued yet.
    pub fn is_fresh(&self) -> bool {
        self.previous_hash.is_none()
    }

    /// Record the hash of the document just issued at [`Self::icv`].
    pub fn advance(&mut self, hash: InvoiceHash) {
        self.previous_hash = Some(hash);
        self.icv += 1;
    }

    /// The state after issuing a document with the given hash.
    pub fn advanced(mut self, hash: InvoiceHash) -> Self {
        self.advance(hash);
        self
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            icv: self.icv,
            previous_hash: self.previous_hash.map(|h| h.to_hex()),
        }
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain fields of one issued document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub icv: u64,
    /// PIH the document carries.
    pub pih: InvoiceHash,
    /// Hash of the document's canonical form.
    pub hash: InvoiceHash,
}

/// Outcome of auditing a run of issued documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainHealth {
    /// Counters are contiguous and every PIH matches its predecessor.
    Intact,

    /// A counter was skipped or repeated.
    Gap {
        /// The ICV that should have followed.
        expected: u64,
        /// The ICV actually found.
        found: u64,
    },

    /// A document's PIH does not match its predecessor's hash.
    Broken {
        /// ICV of the offending document.
        icv: u64,
    },
}

impl ChainHealth {
    pub fn is_intact(&self) -> bool {
        matches!(self, ChainHealth::Intact)
    }

    pub fn has_gap(&self) -> bool {
        matches!(self, ChainHealth::Gap { .. })
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, ChainHealth::Broken { .. })
    }
}

/// Check an ordered run of documents against the chain law.
///
/// The run may start mid-chain. When it starts at ICV 1 the first PIH must be
/// the zero hash. Reports the first defect found.
pub fn audit_chain(links: &[ChainLink]) -> ChainHealth {
    let Some(first) = links.first() else {
        return ChainHealth::Intact;
    };
    if first.icv == 1 && first.pih != InvoiceHash::ZERO {
        return ChainHealth::Broken { icv: first.icv };
    }

    for pair in links.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let expected = prev.icv + 1;
        if next.icv != expected {
            return ChainHealth::Gap {
                expected,
                found: next.icv,
            };
        }
        if next.pih != prev.hash {
            return ChainHealth::Broken { icv: next.icv };
        }
    }
    ChainHealth::Intact
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(n: u64) -> Vec<ChainLink> {
        let mut state = ChainState::new();
        (0..n)
            .map(|i| {
                let hash = InvoiceHash::compute(&i.to_be_bytes());
                let link = ChainLink {
                    icv: state.icv(),
                    pih: state.pih(),
                    hash,
                };
                state.advance(hash);
                link
            })
            .collect()
    }

    #[test]
    fn test_new_chain() {
        let state = ChainState::new();
        assert_eq!(state.icv(), 1);
        assert_eq!(state.previous_hash(), None);
        assert_eq!(state.pih(), InvoiceHash::ZERO);
        assert!(state.is_fresh());
    }

    #[test]
    fn test_advance() {
        let mut state = ChainState::new();
        let h1 = InvoiceHash::compute(b"one");
        state.advance(h1);
        assert_eq!(state.icv(), 2);
        assert_eq!(state.pih(), h1);

        let h2 = InvoiceHash::compute(b"two");
        let next = state.advanced(h2);
        assert_eq!(next.icv(), 3);
        assert_eq!(next.pih(), h2);
        // `advanced` works on a copy.
        assert_eq!(state.icv(), 2);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let h = InvoiceHash::compute(b"doc");
        let state = ChainState::new().advanced(h);
        let snap = state.snapshot();
        assert_eq!(snap.icv, 2);
        assert_eq!(snap.previous_hash.as_deref(), Some(h.to_hex().as_str()));
        assert_eq!(ChainState::restore(&snap).unwrap(), state);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let h = InvoiceHash::compute(b"doc");
        let json = serde_json::to_string(&ChainState::new().advanced(h).snapshot()).unwrap();
        assert_eq!(json, format!("{{\"icv\":2,\"previousHash\":\"{}\"}}", h.to_hex()));

        let fresh = serde_json::to_string(&ChainState::new().snapshot()).unwrap();
        assert_eq!(fresh, "{\"icv\":1,\"previousHash\":null}");
    }

    #[test]
    fn test_restore_accepts_base64() {
        let h = InvoiceHash::compute(b"doc");
        let snap = ChainSnapshot {
            icv: 9,
            previous_hash: Some(h.to_base64()),
        };
        let state = ChainState::restore(&snap).unwrap();
        assert_eq!(state.icv(), 9);
        assert_eq!(state.pih(), h);
        // Written back as hex.
        assert_eq!(state.snapshot().previous_hash, Some(h.to_hex()));
    }

    #[test]
    fn test_restore_rejects_malformed_hash() {
        let snap = ChainSnapshot {
            icv: 2,
            previous_hash: Some("definitely-not-a-hash".into()),
        };
        assert!(matches!(
            ChainState::restore(&snap),
            Err(CoreError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_restore_rejects_inconsistent_state() {
        let zero = ChainSnapshot {
            icv: 0,
            previous_hash: None,
        };
        assert!(matches!(
            ChainState::restore(&zero),
            Err(CoreError::InvalidChainState(_))
        ));

        let orphan = ChainSnapshot {
            icv: 5,
            previous_hash: Some("  ".into()),
        };
        assert!(matches!(
            ChainState::restore(&orphan),
            Err(CoreError::InvalidChainState(_))
        ));
    }

    #[test]
    fn test_restore_rejects_first_position_with_predecessor() {
        let snap = ChainSnapshot {
            icv: 1,
            previous_hash: Some("ab".repeat(32)),
        };
        assert!(matches!(
            ChainState::restore(&snap),
            Err(CoreError::InvalidChainState(_))
        ));

        // A blank hash at ICV 1 is the fresh chain.
        let blank = ChainSnapshot {
            icv: 1,
            previous_hash: Some(" ".into()),
        };
        let state = ChainState::restore(&blank).unwrap();
        assert_eq!(state, ChainState::new());
        assert_eq!(state.pih(), InvoiceHash::ZERO);
    }

    #[test]
    fn test_audit_intact() {
        assert!(audit_chain(&[]).is_intact());
        assert!(audit_chain(&run(5)).is_intact());
        // Mid-chain window.
        assert!(audit_chain(&run(5)[2..]).is_intact());
    }

    #[test]
    fn test_audit_gap() {
        let mut links = run(4);
        links.remove(2);
        assert_eq!(
            audit_chain(&links),
            ChainHealth::Gap {
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn test_audit_broken() {
        let mut links = run(3);
        links[2].pih = InvoiceHash::compute(b"forged");
        let health = audit_chain(&links);
        assert_eq!(health, ChainHealth::Broken { icv: 3 });
        assert!(health.is_broken());

        let mut links = run(2);
        links[0].pih = InvoiceHash::compute(b"not zero");
        assert_eq!(audit_chain(&links), ChainHealth::Broken { icv: 1 });
    }

    #[test]
    fn test_chain_key() {
        let key = ChainKey::from("acme");
        assert_eq!(key.as_str(), "acme");
        assert_eq!(key.to_string(), "acme");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"acme\"");
    }

    proptest! {
        #[test]
        fn prop_icv_gap_free(n in 1u64..64) {
            let links = run(n);
            for (i, link) in links.iter().enumerate() {
                prop_assert_eq!(link.icv, i as u64 + 1);
            }
            prop_assert!(audit_chain(&links).is_intact());
        }
    }
}
