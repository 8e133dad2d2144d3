//! trialdocs-ingestion: everything between the raw exports and plain text.
//! - Reference extraction from the "Study Documents" cell
//! - RIS bibliographic parsing and CSV row loading
//! - Document fetching and PDF text extraction
//! - Character-window chunking
//! - Bulk downloading of referenced documents

pub mod chunker;
pub mod downloader;
pub mod fetcher;
pub mod pdf_parser;
pub mod references;
pub mod ris;
pub mod tabular;

pub use chunker::{chunk_text, ChunkerConfig};
pub use fetcher::{DocumentFetcher, DocumentSource, FetchError, HttpFetcher};
pub use references::extract_references;
pub use ris::{load_ris, parse_ris};
pub use tabular::{load_trial_rows, TrialRow};
