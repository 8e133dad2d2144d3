//! Retrieval and generation settings for the answer pipeline.

use serde::{Deserialize, Serialize};
use trialdocs_ingestion::ChunkerConfig;

/// Configuration for context building and answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunks passed to the generator per question (default: 8)
    pub top_k: usize,

    /// Chunk window width in characters (default: 700)
    pub chunk_chars: usize,

    /// Characters shared by consecutive chunks (default: 120)
    pub chunk_overlap: usize,

    /// Documents read per trial; the rest are ignored (default: 5)
    pub max_sources: usize,

    /// Expected embedding dimension (default: 1536)
    pub embedding_dim: usize,

    /// Sampling temperature for answers (default: 0.1)
    pub temperature: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            chunk_chars: 700,
            chunk_overlap: 120,
            max_sources: 5,
            embedding_dim: 1536,
            temperature: 0.1,
        }
    }
}

impl RagConfig {
    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            window_chars: self.chunk_chars,
            overlap_chars: self.chunk_overlap,
        }
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_chunking(mut self, chars: usize, overlap: usize) -> Self {
        self.chunk_chars = chars;
        self.chunk_overlap = overlap;
        self
    }

    pub fn with_max_sources(mut self, n: usize) -> Self {
        self.max_sources = n;
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }
}
