//! Embedding index: batch embedding through an [`LlmBackend`] and cosine top-K ranking.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, instrument};
use trialdocs_llm::{LlmBackend, LlmError};

/// Added to the cosine denominator so all-zero vectors score 0 instead of NaN.
pub const COSINE_EPSILON: f32 = 1e-8;

pub struct EmbeddingIndex {
    backend: Arc<dyn LlmBackend>,
    dim: usize,
}

impl EmbeddingIndex {
    pub fn new(backend: Arc<dyn LlmBackend>, dim: usize) -> Self {
        Self { backend, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// One vector per text, in order. An empty input makes no service call.
    #[instrument(skip(self, texts), fields(n = texts.len()))]
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.backend.embed(texts.to_vec()).await?;

        if vectors.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(LlmError::InvalidResponse(format!(
                "expected dimension {}, got {}",
                self.dim,
                bad.len()
            )));
        }
        Ok(vectors)
    }

    /// The `k` items whose vectors are most similar to `query`, best first.
    ///
    /// `items` and `vectors` are parallel. With no items the query is not embedded.
    pub async fn top_k<'a, T>(
        &self,
        query: &str,
        items: &'a [T],
        vectors: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<&'a T>, LlmError> {
        if items.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embed(&[query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse("no query embedding returned".into()))?;

        let n = items.len().min(vectors.len());
        let ranked = rank_by_similarity(&query_vec, &vectors[..n], k);
        debug!(candidates = n, selected = ranked.len(), "Chunks ranked");
        Ok(ranked.into_iter().map(|i| &items[i]).collect())
    }
}

/// `a·b / (|a||b| + ε)`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + COSINE_EPSILON)
}

/// Indices of the `k` most similar vectors, descending; equal scores keep input order.
pub fn rank_by_similarity(query: &[f32], vectors: &[Vec<f32>], k: usize) -> Vec<usize> {
    let scores: Vec<f32> = vectors.iter().map(|v| cosine_similarity(query, v)).collect();
    let mut order: Vec<usize> = (0..vectors.len()).collect();
    // sort_by is stable.
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    order.truncate(k);
    order
}
