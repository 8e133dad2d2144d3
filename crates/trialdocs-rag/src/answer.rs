//! Grounded question answering over a trial's cached context.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use trialdocs_common::{TrialId, TrialMetadata};
use trialdocs_ingestion::DocumentFetcher;
use trialdocs_llm::{LlmBackend, LlmRequest, Message};

use crate::catalog::TrialCatalog;
use crate::config::RagConfig;
use crate::context::{ContextCache, TextChunk};
use crate::embedding::EmbeddingIndex;
use crate::error::{RagError, Result};

/// Returned instead of a generated answer when no document text could be read.
pub const NO_CONTENT_MESSAGE: &str = "I couldn't load any text for this study yet (no readable PDFs). \
     Try again or check the CSV links.";

pub const SYSTEM_PROMPT: &str = "You answer questions about a single clinical study. \
     Use only the provided context chunks (RIS + PDF text). Cite short quotes. \
     If you don't see an answer in context, say so honestly.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub meta: TrialMetadata,
}

pub struct AnswerService {
    cache: ContextCache,
    index: Arc<EmbeddingIndex>,
    llm: Arc<dyn LlmBackend>,
    config: RagConfig,
}

impl AnswerService {
    /// Wire the cache and index around one LLM backend.
    pub fn new(
        catalog: Arc<TrialCatalog>,
        fetcher: Arc<dyn DocumentFetcher>,
        llm: Arc<dyn LlmBackend>,
        config: RagConfig,
    ) -> Self {
        let index = Arc::new(EmbeddingIndex::new(Arc::clone(&llm), config.embedding_dim));
        let cache = ContextCache::new(catalog, fetcher, Arc::clone(&index), config.clone());
        Self { cache, index, llm, config }
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Answer `question` about the trial named by `raw_id` (any spelling).
    #[instrument(skip(self, question), fields(nct = %TrialId::normalize(raw_id)))]
    pub async fn answer(&self, raw_id: &str, question: &str) -> Result<Answer> {
        let id = TrialId::normalize(raw_id);
        let ctx = self.cache.get_or_build(&id).await?;

        if ctx.chunks.is_empty() {
            info!("No readable content; skipping generation");
            return Ok(Answer {
                answer: NO_CONTENT_MESSAGE.to_string(),
                meta: ctx.metadata.clone(),
            });
        }

        let top = self
            .index
            .top_k(question, &ctx.chunks, &ctx.vectors, self.config.top_k)
            .await
            .map_err(RagError::Embedding)?;

        let req = LlmRequest {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(build_user_prompt(&ctx.metadata, &top, question)?),
            ],
            temperature: Some(self.config.temperature),
            ..Default::default()
        };
        let resp = self.llm.complete(req).await.map_err(RagError::Generation)?;

        info!(
            n_context = top.len(),
            completion_tokens = resp.completion_tokens,
            "Answer generated"
        );
        Ok(Answer {
            answer: resp.content.trim().to_string(),
            meta: ctx.metadata.clone(),
        })
    }
}

/// Metadata as JSON, the numbered chunks, then the question.
pub fn build_user_prompt(
    meta: &TrialMetadata,
    chunks: &[&TextChunk],
    question: &str,
) -> Result<String> {
    let meta_json = serde_json::to_string(meta)?;
    let context = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Chunk {}]\n{}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(format!(
        "RIS metadata:\n{meta_json}\n\n\
         Context chunks from PDFs:\n{context}\n\n\
         Question: {question}\n\n\
         Answer clearly and concisely, cite page numbers if visible in the text."
    ))
}
