//! In-memory view of everything known about each trial before any fetching:
//! CSV rows, RIS records, and the local download directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use trialdocs_common::error::Result;
use trialdocs_common::{BibliographicRecord, TrialId, TrialMetadata};
use trialdocs_ingestion::{load_ris, load_trial_rows, DocumentSource, TrialRow};

pub struct TrialCatalog {
    rows: HashMap<TrialId, TrialRow>,
    bibliography: HashMap<TrialId, BibliographicRecord>,
    download_dir: PathBuf,
}

impl TrialCatalog {
    pub fn new(
        rows: HashMap<TrialId, TrialRow>,
        bibliography: HashMap<TrialId, BibliographicRecord>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rows,
            bibliography,
            download_dir: download_dir.into(),
        }
    }

    /// Load the CSV (required) and RIS (optional) exports.
    pub fn load(csv_path: &Path, ris_path: &Path, download_dir: impl Into<PathBuf>) -> Result<Self> {
        let rows = load_trial_rows(csv_path)?;
        let bibliography = load_ris(ris_path)?;
        let catalog = Self::new(rows, bibliography, download_dir);
        info!(
            trials = catalog.rows.len(),
            records = catalog.bibliography.len(),
            download_dir = %catalog.download_dir.display(),
            "Trial catalog ready"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &HashMap<TrialId, TrialRow> {
        &self.rows
    }

    pub fn bibliography(&self) -> &HashMap<TrialId, BibliographicRecord> {
        &self.bibliography
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Provenance metadata; fields unknown to both sources are empty.
    pub fn metadata(&self, id: &TrialId) -> TrialMetadata {
        let row = self.rows.get(id);
        let record = self.bibliography.get(id);

        let title = record
            .map(|r| r.title.clone())
            .filter(|t| !t.is_empty())
            .or_else(|| row.map(|r| r.title.clone()))
            .unwrap_or_default();

        TrialMetadata {
            nct: id.clone(),
            title,
            year: record.map(|r| r.year.clone()).unwrap_or_default(),
            authors: record
                .map(|r| r.first_author.clone())
                .filter(|a| !a.is_empty())
                .into_iter()
                .collect(),
            registry_url: row.map(|r| r.registry_url.clone()).unwrap_or_default(),
            doc_urls: row.map(TrialRow::doc_urls).unwrap_or_default(),
        }
    }

    /// `.pdf` files (any case) directly inside `<download_dir>/<id>`, by file name.
    pub fn local_documents(&self, id: &TrialId) -> Vec<PathBuf> {
        let folder = self.download_dir.join(id.as_str());
        let Ok(entries) = std::fs::read_dir(&folder) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        files.sort();
        files
    }

    /// Documents to read for a trial: local files when any exist, otherwise the CSV links.
    pub fn sources_for(&self, id: &TrialId) -> Vec<DocumentSource> {
        let local = self.local_documents(id);
        if !local.is_empty() {
            debug!(nct = %id, n = local.len(), "Using local documents");
            return local.into_iter().map(DocumentSource::Local).collect();
        }
        self.rows
            .get(id)
            .map(|row| {
                row.references
                    .iter()
                    .map(|r| DocumentSource::parse(&r.url))
                    .collect()
            })
            .unwrap_or_default()
    }
}
