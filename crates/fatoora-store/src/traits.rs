//! ChainStore trait: the abstract interface for chain persistence.
//!
//! The engine only ever reads a snapshot once and then writes through
//! compare-and-swap, so a second process issuing on the same chain is caught
//! instead of silently forking it.

use async_trait::async_trait;
use fatoora_core::{ChainKey, ChainSnapshot, ChainState};

use crate::error::Result;

/// Result of a compare-and-swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapResult {
    /// The snapshot was written.
    Swapped,
    /// The stored position was not the expected one.
    Conflict {
        /// What is stored now; `None` if the chain does not exist.
        current: Option<ChainSnapshot>,
    },
}

impl SwapResult {
    pub fn is_swapped(&self) -> bool {
        matches!(self, SwapResult::Swapped)
    }
}

/// The ChainStore trait: async interface for chain snapshots.
///
/// # Design Notes
///
/// - **Single position per chain**: only the latest snapshot is kept.
/// - **Optimistic writes**: `compare_and_swap` succeeds only when the stored
///   ICV equals `expected_icv` (`None` meaning no snapshot stored yet).
/// - **One step at a time**: `next` must sit exactly one position after the
///   expected one; anything else is `InvalidData`.
#[async_trait]
pub trait ChainStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Snapshot Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the latest snapshot of a chain.
    async fn load(&self, key: &ChainKey) -> Result<Option<ChainSnapshot>>;

    /// Replace the snapshot of a chain if it is still at `expected_icv`.
    ///
    /// # Returns
    /// - `Swapped` if the snapshot was written.
    /// - `Conflict` with the current snapshot otherwise.
    async fn compare_and_swap(
        &self,
        key: &ChainKey,
        expected_icv: Option<u64>,
        next: &ChainSnapshot,
    ) -> Result<SwapResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Keys of all stored chains, sorted.
    async fn chains(&self) -> Result<Vec<ChainKey>>;
}

/// A restored chain position and the ICV the store holds for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedChain {
    pub state: ChainState,
    /// `None` when nothing is stored yet; pass it to `compare_and_swap`.
    pub stored_icv: Option<u64>,
}

/// Extension methods for ChainStore.
pub trait ChainStoreExt: ChainStore {
    /// Load a chain, restore its state and remember the stored ICV.
    fn load_chain(
        &self,
        key: &ChainKey,
    ) -> impl std::future::Future<Output = Result<LoadedChain>> + Send;

    /// Load a chain and rebuild its state. A missing chain is a fresh one.
    fn load_state(
        &self,
        key: &ChainKey,
    ) -> impl std::future::Future<Output = Result<ChainState>> + Send;
}

impl<S: ChainStore + ?Sized> ChainStoreExt for S {
    async fn load_chain(&self, key: &ChainKey) -> Result<LoadedChain> {
        Ok(match self.load(key).await? {
            Some(snapshot) => LoadedChain {
                state: ChainState::restore(&snapshot)?,
                stored_icv: Some(snapshot.icv),
            },
            None => LoadedChain {
                state: ChainState::new(),
                stored_icv: None,
            },
        })
    }

    async fn load_state(&self, key: &ChainKey) -> Result<ChainState> {
        Ok(self.load_chain(key).await?.state)
    }
}

/// Check that `next` is exactly one step past `expected_icv`.
pub(crate) fn check_step(expected_icv: Option<u64>, next: &ChainSnapshot) -> Result<()> {
    let from = expected_icv.unwrap_or(1);
    if next.icv != from + 1 {
        return Err(crate::StoreError::InvalidData(format!(
            "snapshot at ICV {} does not follow ICV {from}",
            next.icv
        )));
    }
    if next.previous_hash.as_deref().map_or(true, |h| h.trim().is_empty()) {
        return Err(crate::StoreError::InvalidData(format!(
            "snapshot at ICV {} has no previous invoice hash",
            next.icv
        )));
    }
    Ok(())
}
