//! # Fatoora Store
//!
//! Persistence seam for invoice chains. The engine keeps the ICV and PIH of
//! every company chain behind the [`ChainStore`] trait, so it does not care
//! where the position lives.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - The async trait for chain snapshots
//! - [`MemoryChainStore`] - In-memory implementation, with JSON dump/seed
//! - [`SwapResult`] - Result of a compare-and-swap
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fatoora_core::{ChainKey, ChainState, InvoiceHash};
//! use fatoora_store::{ChainStore, ChainStoreExt, MemoryChainStore};
//!
//! async fn example() {
//!     let store = MemoryChainStore::new();
//!     let key = ChainKey::from("acme");
//!
//!     let state = store.load_state(&key).await.unwrap();
//!     let next = state.advanced(InvoiceHash::compute(b"<Invoice/>"));
//!     store.compare_and_swap(&key, None, &next.snapshot()).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Compare-and-swap writes**: a writer holding a stale position gets
//!   `Conflict` instead of overwriting a newer one
//! - **Strict restore**: a stored snapshot with a malformed hash is an error,
//!   never a silently fresh chain

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryChainStore;
pub use traits::{ChainStore, ChainStoreExt, LoadedChain, SwapResult};
