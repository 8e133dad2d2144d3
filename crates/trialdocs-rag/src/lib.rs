//! trialdocs-rag: retrieval-augmented answering over trial documents.
//!
//! # Flow
//! question + trial id → [`ContextCache`] (fetch, chunk, embed once per trial)
//! → [`EmbeddingIndex::top_k`] → [`AnswerService`] prompt → LLM answer.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trialdocs_ingestion::HttpFetcher;
//! use trialdocs_llm::OpenAiBackend;
//! use trialdocs_rag::{AnswerService, RagConfig, TrialCatalog};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = TrialCatalog::load(
//!         "ctg-studies.csv".as_ref(),
//!         "ctg-studies.ris".as_ref(),
//!         "downloads",
//!     )?;
//!     let llm = OpenAiBackend::new(
//!         "https://api.openai.com/v1",
//!         "gpt-4o-mini",
//!         std::env::var("OPENAI_API_KEY").ok().map(Into::into),
//!         Duration::from_secs(60),
//!     )?;
//!     let service = AnswerService::new(
//!         Arc::new(catalog),
//!         Arc::new(HttpFetcher::new(Duration::from_secs(60))?),
//!         Arc::new(llm),
//!         RagConfig::default(),
//!     );
//!
//!     let answer = service.answer("nct4019", "What is the enrollment target?").await?;
//!     println!("{}", answer.answer);
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod catalog;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;

pub use answer::{Answer, AnswerService, NO_CONTENT_MESSAGE};
pub use catalog::TrialCatalog;
pub use config::RagConfig;
pub use context::{ContextCache, ContextEntry, TextChunk};
pub use embedding::EmbeddingIndex;
pub use error::{RagError, Result};
