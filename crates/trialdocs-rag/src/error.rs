//! Error types for context building and answering.

use thiserror::Error;
use trialdocs_llm::LlmError;

pub type Result<T> = std::result::Result<T, RagError>;

/// Request-level failures. Per-document fetch failures never surface here.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding service failed: {0}")]
    Embedding(#[source] LlmError),

    #[error("Generation service failed: {0}")]
    Generation(#[source] LlmError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RagError {
    /// True when the upstream call hit its timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            RagError::Embedding(e) | RagError::Generation(e) => e.is_timeout(),
            RagError::Json(_) => false,
        }
    }
}
