//! The Engine: issues invoices for one company on one chain.
//!
//! Issuing is single-writer. The engine holds the chain position behind a
//! `tokio::sync::Mutex`, and writes it back through the store's
//! compare-and-swap so a second process on the same chain is detected.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use fatoora_core::{
    assemble, AssembledInvoice, ChainKey, ChainLink, ChainState, InvoiceHash, QrOptions,
    SigningCapability,
};
use fatoora_store::{ChainStore, ChainStoreExt, LoadedChain, SwapResult};

use crate::config::{CompanyProfile, EngineConfig};
use crate::error::{EngineError, Result};
use crate::request::InvoiceRequest;

/// An invoice the engine issued and recorded on its chain.
#[derive(Debug, Clone)]
pub struct IssuedInvoice {
    pub chain: ChainKey,
    pub document: AssembledInvoice,
}

impl IssuedInvoice {
    pub fn icv(&self) -> u64 {
        self.document.invoice.icv()
    }

    pub fn hash(&self) -> InvoiceHash {
        self.document.hash
    }

    pub fn xml(&self) -> &[u8] {
        &self.document.xml
    }

    pub fn qr(&self) -> Option<&str> {
        self.document.qr.as_deref()
    }

    pub fn chain_link(&self) -> ChainLink {
        self.document.chain_link()
    }
}

/// The main Engine struct.
///
/// Provides a unified API for:
/// - Issuing chained invoices
/// - Reading the chain position
pub struct Engine<S: ChainStore> {
    /// The issuing company.
    profile: CompanyProfile,
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: EngineConfig,
    /// Signs QR payloads when set.
    signer: Option<Arc<dyn SigningCapability>>,
    /// Loaded on first use; dropped after a conflict.
    cursor: Mutex<Option<LoadedChain>>,
}

impl<S: ChainStore> Engine<S> {
    /// Create a new engine instance.
    pub fn new(profile: CompanyProfile, store: S, config: EngineConfig) -> Self {
        Self::with_shared_store(profile, Arc::new(store), config)
    }

    /// Create an engine over a store shared with other engines.
    pub fn with_shared_store(profile: CompanyProfile, store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            profile,
            store,
            config,
            signer: None,
            cursor: Mutex::new(None),
        }
    }

    /// Sign QR payloads with the given capability.
    pub fn with_signer(mut self, signer: impl SigningCapability + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn profile(&self) -> &CompanyProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Chain Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The position the next invoice will take.
    pub async fn chain_state(&self) -> Result<ChainState> {
        let mut cursor = self.cursor.lock().await;
        Ok(self.load_cursor(&mut cursor).await?.state)
    }

    /// Issue the next invoice on this company's chain.
    ///
    /// The chain advances only once the document is assembled and the store
    /// accepted the new position. A request that fails validation or
    /// assembly consumes no ICV.
    pub async fn issue(&self, request: InvoiceRequest) -> Result<IssuedInvoice> {
        let span = info_span!(
            "issue",
            company = %self.profile.key,
            number = %request.number,
            icv = tracing::field::Empty,
        );
        self.issue_inner(request).instrument(span).await
    }

    async fn issue_inner(&self, request: InvoiceRequest) -> Result<IssuedInvoice> {
        let mut guard = self.cursor.lock().await;
        let cursor = self.load_cursor(&mut guard).await?;
        tracing::Span::current().record("icv", cursor.state.icv());

        let draft = request.into_draft(&self.profile.seller, &self.config, &cursor.state);
        let qr = match (&self.signer, self.config.emit_qr) {
            (_, false) => QrOptions::Omit,
            (Some(signer), true) => QrOptions::Signed(signer.as_ref()),
            (None, true) => QrOptions::Unsigned,
        };

        let document = match assemble(draft, qr) {
            Ok(document) => document,
            Err(e) => {
                debug!("assembly failed: {}", e);
                return Err(e.into());
            }
        };

        let next = cursor.state.advanced(document.hash);
        let swap = self
            .store
            .compare_and_swap(&self.profile.key, cursor.stored_icv, &next.snapshot())
            .await?;

        match swap {
            SwapResult::Swapped => {
                *guard = Some(LoadedChain {
                    state: next,
                    stored_icv: Some(next.icv()),
                });
                info!(hash = %document.hash, "invoice issued");
                Ok(IssuedInvoice {
                    chain: self.profile.key.clone(),
                    document,
                })
            }
            SwapResult::Conflict { current } => {
                *guard = None;
                let found = current.map(|s| s.icv);
                warn!(
                    "chain {} moved underneath us: expected {:?}, found {:?}",
                    self.profile.key, cursor.stored_icv, found
                );
                Err(EngineError::ChainConflict {
                    chain: self.profile.key.clone(),
                    expected: cursor.stored_icv,
                    found,
                })
            }
        }
    }

    /// The cached cursor, loading it from the store on first use.
    async fn load_cursor(&self, slot: &mut Option<LoadedChain>) -> Result<LoadedChain> {
        if let Some(cursor) = *slot {
            return Ok(cursor);
        }
        let cursor = self.store.load_chain(&self.profile.key).await?;
        debug!(
            "loaded chain {} at ICV {}",
            self.profile.key,
            cursor.state.icv()
        );
        *slot = Some(cursor);
        Ok(cursor)
    }
}
