//! trialdocs-common: Shared types, errors, and identifier handling used across all trialdocs crates.

pub mod error;
pub mod identifier;
pub mod models;

// Re-export commonly used types
pub use identifier::TrialId;
pub use models::{BibliographicRecord, DocumentReference, TrialMetadata};
