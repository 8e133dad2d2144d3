//! Per-trial context cache.
//!
//! The first request for a trial fetches its documents, chunks and embeds
//! them, and stores the result for the life of the process. Each key owns a
//! [`OnceCell`]: concurrent requests for the same trial wait on the one build
//! in flight, requests for other trials are not blocked. A build that fails
//! leaves its cell empty so the next request tries again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};
use trialdocs_common::{TrialId, TrialMetadata};
use trialdocs_ingestion::{chunk_text, DocumentFetcher, DocumentSource};

use crate::catalog::TrialCatalog;
use crate::config::RagConfig;
use crate::embedding::EmbeddingIndex;
use crate::error::{RagError, Result};

/// A window of document text plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub source: DocumentSource,
    /// Position of this chunk within its source document.
    pub index: usize,
}

/// Everything needed to answer questions about one trial.
#[derive(Debug)]
pub struct ContextEntry {
    pub identifier: TrialId,
    pub metadata: TrialMetadata,
    pub chunks: Vec<TextChunk>,
    /// Parallel to `chunks`.
    pub vectors: Vec<Vec<f32>>,
}

type Slot = Arc<OnceCell<Arc<ContextEntry>>>;

pub struct ContextCache {
    catalog: Arc<TrialCatalog>,
    fetcher: Arc<dyn DocumentFetcher>,
    index: Arc<EmbeddingIndex>,
    config: RagConfig,
    entries: RwLock<HashMap<TrialId, Slot>>,
}

impl std::fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextCache")
            .field("max_sources", &self.config.max_sources)
            .field("entries", &"<cached contexts>")
            .finish()
    }
}

impl ContextCache {
    pub fn new(
        catalog: Arc<TrialCatalog>,
        fetcher: Arc<dyn DocumentFetcher>,
        index: Arc<EmbeddingIndex>,
        config: RagConfig,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            index,
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &TrialCatalog {
        &self.catalog
    }

    /// Return the cached context for `id`, building it on first use.
    pub async fn get_or_build(&self, id: &TrialId) -> Result<Arc<ContextEntry>> {
        let slot = {
            let entries = self.entries.read().await;
            entries.get(id).cloned()
        };
        let slot = match slot {
            Some(slot) => slot,
            None => {
                let mut entries = self.entries.write().await;
                Arc::clone(entries.entry(id.clone()).or_default())
            }
        };

        if let Some(entry) = slot.get() {
            debug!(nct = %id, "Context cache hit");
            return Ok(Arc::clone(entry));
        }

        let entry = slot
            .get_or_try_init(|| async { self.build(id).await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(entry))
    }

    /// Number of trials with a completed context.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, id: &TrialId) -> bool {
        let entries = self.entries.read().await;
        entries.get(id).is_some_and(|slot| slot.initialized())
    }

    #[instrument(skip(self), fields(nct = %id))]
    async fn build(&self, id: &TrialId) -> Result<ContextEntry> {
        let sources = self.catalog.sources_for(id);
        if sources.len() > self.config.max_sources {
            debug!(
                available = sources.len(),
                used = self.config.max_sources,
                "Source list capped"
            );
        }

        let chunker = self.config.chunker();
        let mut chunks = Vec::new();
        for source in sources.into_iter().take(self.config.max_sources) {
            let text = match self.fetcher.fetch_text(&source).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(source = %source, error = %e, "Skipping unreadable document");
                    continue;
                }
            };
            let pieces = chunk_text(&text, &chunker);
            debug!(source = %source, n_chunks = pieces.len(), "Document chunked");
            chunks.extend(pieces.into_iter().enumerate().map(|(index, text)| TextChunk {
                text,
                source: source.clone(),
                index,
            }));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.index.embed(&texts).await.map_err(RagError::Embedding)?;

        info!(n_chunks = chunks.len(), "Context built");
        Ok(ContextEntry {
            identifier: id.clone(),
            metadata: self.catalog.metadata(id),
            chunks,
            vectors,
        })
    }
}
