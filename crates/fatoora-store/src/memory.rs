//! In-memory implementation of the ChainStore trait.
//!
//! Same semantics as a persistent backend, but everything lives in a map.
//! [`MemoryChainStore::to_json`] and [`MemoryChainStore::from_json`] dump and
//! seed the map so a process can carry its chains across restarts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use fatoora_core::{ChainKey, ChainSnapshot, ChainState};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::traits::{check_step, ChainStore, SwapResult};

/// In-memory chain store.
///
/// Thread-safe via RwLock.
pub struct MemoryChainStore {
    inner: RwLock<HashMap<ChainKey, ChainSnapshot>>,
}

impl MemoryChainStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Seed from a JSON object mapping chain keys to snapshots.
    ///
    /// Every snapshot must restore to a valid chain position.
    pub fn from_json(json: &str) -> Result<Self> {
        let chains: HashMap<ChainKey, ChainSnapshot> = serde_json::from_str(json)?;
        for (key, snapshot) in &chains {
            ChainState::restore(snapshot).map_err(|e| {
                StoreError::InvalidData(format!("chain {key}: {e}"))
            })?;
        }
        Ok(Self {
            inner: RwLock::new(chains),
        })
    }

    /// Dump all chains as a JSON object, keys sorted.
    pub fn to_json(&self) -> Result<String> {
        let inner = self.read()?;
        let sorted: BTreeMap<&ChainKey, &ChainSnapshot> = inner.iter().collect();
        Ok(serde_json::to_string_pretty(&sorted)?)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ChainKey, ChainSnapshot>>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ChainKey, ChainSnapshot>>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainStore for MemoryChainStore {
    async fn load(&self, key: &ChainKey) -> Result<Option<ChainSnapshot>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &ChainKey,
        expected_icv: Option<u64>,
        next: &ChainSnapshot,
    ) -> Result<SwapResult> {
        check_step(expected_icv, next)?;

        let mut inner = self.write()?;
        let current = inner.get(key);
        if current.map(|s| s.icv) != expected_icv {
            warn!(
                chain = %key,
                expected = ?expected_icv,
                found = ?current.map(|s| s.icv),
                "chain swap conflict"
            );
            return Ok(SwapResult::Conflict {
                current: current.cloned(),
            });
        }

        inner.insert(key.clone(), next.clone());
        debug!(chain = %key, icv = next.icv, "chain advanced");
        Ok(SwapResult::Swapped)
    }

    async fn chains(&self) -> Result<Vec<ChainKey>> {
        let mut keys: Vec<ChainKey> = self.read()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
