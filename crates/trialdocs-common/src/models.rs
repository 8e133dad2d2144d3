//! Data models shared by ingestion, retrieval and the web API.

use serde::{Deserialize, Serialize};

use crate::identifier::TrialId;

/// Label used when a document link has no descriptive text in front of it.
pub const DEFAULT_DOCUMENT_LABEL: &str = "Document";

/// One document link found in a trial's "Study Documents" cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Descriptive text, e.g. "Informed Consent Form". Never empty.
    pub label: String,
    /// Absolute http(s) URL.
    pub url: String,
}

impl DocumentReference {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        let label = label.into();
        let label = if label.trim().is_empty() {
            DEFAULT_DOCUMENT_LABEL.to_string()
        } else {
            label
        };
        Self { label, url: url.into() }
    }
}

/// Citation metadata for one trial, taken from the RIS export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    pub identifier: TrialId,
    pub title: String,
    pub year: String,
    /// Text of the `AU` tag before its first comma; empty when absent.
    pub first_author: String,
}

/// Provenance metadata returned alongside every answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialMetadata {
    pub nct: TrialId,
    pub title: String,
    pub year: String,
    pub authors: Vec<String>,
    pub registry_url: String,
    pub doc_urls: Vec<String>,
}
