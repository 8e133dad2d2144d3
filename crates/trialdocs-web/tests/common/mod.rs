//! In-process fixtures: a scripted LLM backend and a canned document fetcher.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use trialdocs_common::{DocumentReference, TrialId};
use trialdocs_ingestion::{DocumentFetcher, DocumentSource, FetchError, TrialRow};
use trialdocs_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};
use trialdocs_rag::{AnswerService, RagConfig, TrialCatalog};
use trialdocs_web::{build_router, AppState};

pub const DOC_URL: &str = "https://x.org/protocol.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    EmbedTimeout,
    GenerationError,
}

pub struct ScriptedLlm {
    pub failure: Failure,
    pub complete_calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(failure: Failure) -> Arc<Self> {
        Arc::new(Self { failure, complete_calls: AtomicUsize::new(0) })
    }

    pub fn completes(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure == Failure::GenerationError {
            return Err(LlmError::ApiError { status: 500, message: "model overloaded".into() });
        }
        Ok(LlmResponse {
            content: "Enrollment is 120 participants.\n".into(),
            model: "scripted".into(),
            prompt_tokens: 1,
            completion_tokens: 1,
        })
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        if self.failure == Failure::EmbedTimeout {
            return Err(LlmError::Timeout);
        }
        Ok(texts.iter().map(|t| vec![1.0, t.len() as f32]).collect())
    }

    fn model_id(&self) -> &str { "scripted" }
    fn embedding_model_id(&self) -> &str { "scripted" }
}

/// Returns the same text for [`DOC_URL`]; everything else is a 404.
pub struct CannedFetcher;

#[async_trait]
impl DocumentFetcher for CannedFetcher {
    async fn fetch_text(&self, source: &DocumentSource) -> Result<String, FetchError> {
        match source {
            DocumentSource::Remote(url) if url == DOC_URL => {
                Ok("The trial plans to enroll 120 participants.".into())
            }
            _ => Err(FetchError::Status(404)),
        }
    }
}

/// Router over a catalog with trial 1 (one readable document) and trial 2 (no documents).
pub fn app(llm: Arc<ScriptedLlm>, download_dir: &std::path::Path) -> axum::Router {
    let mut rows = HashMap::new();
    for (raw, refs) in [("1", vec![DocumentReference::new("Protocol", DOC_URL)]), ("2", vec![])] {
        let id = TrialId::normalize(raw);
        rows.insert(
            id.clone(),
            TrialRow {
                id: id.clone(),
                title: format!("Study {id}"),
                registry_url: format!("https://clinicaltrials.gov/study/{id}"),
                references: refs,
            },
        );
    }
    let catalog = Arc::new(TrialCatalog::new(rows, HashMap::new(), download_dir));
    let service = AnswerService::new(
        catalog,
        Arc::new(CannedFetcher),
        llm,
        RagConfig::default().with_embedding_dim(2),
    );
    build_router(AppState::new(Arc::new(service)))
}
