//! Mock LLM backend and document fetcher with call counters.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use trialdocs_common::{BibliographicRecord, DocumentReference, TrialId};
use trialdocs_ingestion::{DocumentFetcher, DocumentSource, FetchError, TrialRow};
use trialdocs_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};
use trialdocs_rag::TrialCatalog;

pub const DIM: usize = 256;

/// Bag-of-words hashing embedder; completions return a canned answer.
pub struct MockLlm {
    pub embed_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    pub fail_embed: AtomicBool,
    pub fail_complete: AtomicBool,
    pub last_request: Mutex<Option<LlmRequest>>,
    pub reply: String,
}

impl MockLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            embed_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
            fail_embed: AtomicBool::new(false),
            fail_complete: AtomicBool::new(false),
            last_request: Mutex::new(None),
            reply: "  The answer.  ".to_string(),
        })
    }

    pub fn embeds(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn completes(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    fn vectorise(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let mut h = DefaultHasher::new();
            word.hash(&mut h);
            v[(h.finish() % DIM as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl LlmBackend for MockLlm {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(req);
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(LlmError::ApiError { status: 500, message: "boom".into() });
        }
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: "mock-chat".into(),
            prompt_tokens: 10,
            completion_tokens: 3,
        })
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed.load(Ordering::SeqCst) {
            return Err(LlmError::Timeout);
        }
        Ok(texts.iter().map(|t| Self::vectorise(t)).collect())
    }

    fn model_id(&self) -> &str { "mock-chat" }
    fn embedding_model_id(&self) -> &str { "mock-embed" }
}

/// Serves canned text per source; unknown sources fail with HTTP 404.
pub struct MockFetcher {
    pub docs: HashMap<String, String>,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl MockFetcher {
    pub fn new(docs: &[(&str, &str)]) -> Arc<Self> {
        Self::with_delay(docs, Duration::ZERO)
    }

    pub fn with_delay(docs: &[(&str, &str)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            docs: docs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch_text(&self, source: &DocumentSource) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.docs
            .get(&source.to_string())
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}

/// A catalog with one trial per `(id, urls)` pair; RIS data only for trial 1.
pub fn catalog(download_dir: &Path, trials: &[(&str, &[&str])]) -> Arc<TrialCatalog> {
    let mut rows = HashMap::new();
    for (raw, urls) in trials {
        let id = TrialId::normalize(raw);
        rows.insert(
            id.clone(),
            TrialRow {
                id: id.clone(),
                title: format!("CSV title {id}"),
                registry_url: format!("https://clinicaltrials.gov/study/{id}"),
                references: urls
                    .iter()
                    .map(|u| DocumentReference::new("Document", *u))
                    .collect(),
            },
        );
    }
    let mut bibliography = HashMap::new();
    let first = TrialId::normalize("1");
    bibliography.insert(
        first.clone(),
        BibliographicRecord {
            identifier: first,
            title: "RIS title".into(),
            year: "2021".into(),
            first_author: "Smith".into(),
        },
    );
    Arc::new(TrialCatalog::new(rows, bibliography, download_dir))
}
