//! Loader for the registry CSV export.
//!
//! Only four columns are used; any other column is ignored and a missing one
//! reads as an empty string. Rows are keyed by normalised identifier and a
//! later row for the same trial replaces an earlier one.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trialdocs_common::error::Result;
use trialdocs_common::{DocumentReference, TrialId};

use crate::references::extract_references;

pub const COL_IDENTIFIER: &str = "NCT Number";
pub const COL_DOCUMENTS: &str = "Study Documents";
pub const COL_TITLE: &str = "Study Title";
pub const COL_REGISTRY_URL: &str = "Study URL";

/// One trial as described by the CSV export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRow {
    pub id: TrialId,
    pub title: String,
    pub registry_url: String,
    /// References extracted from the documents cell, in cell order.
    pub references: Vec<DocumentReference>,
}

impl TrialRow {
    /// Reference URLs in order, duplicates included.
    pub fn doc_urls(&self) -> Vec<String> {
        self.references.iter().map(|r| r.url.clone()).collect()
    }
}

/// Read the CSV export at `path`.
pub fn load_trial_rows(path: &Path) -> Result<HashMap<TrialId, TrialRow>> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let rows = read_trial_rows(reader)?;
    info!(path = %path.display(), n = rows.len(), "Trial rows loaded");
    Ok(rows)
}

/// Parse CSV data from any reader; the first record is the header row.
pub fn parse_trial_rows<R: std::io::Read>(input: R) -> Result<HashMap<TrialId, TrialRow>> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    read_trial_rows(reader)
}

fn read_trial_rows<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<HashMap<TrialId, TrialRow>> {
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let id_col = column(COL_IDENTIFIER);
    let docs_col = column(COL_DOCUMENTS);
    let title_col = column(COL_TITLE);
    let url_col = column(COL_REGISTRY_URL);

    if id_col.is_none() {
        debug!("CSV has no '{COL_IDENTIFIER}' column; every row maps to the zero identifier");
    }

    let mut rows = HashMap::new();
    for result in reader.records() {
        let record = result?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let id = TrialId::normalize(&cell(id_col));
        let row = TrialRow {
            id: id.clone(),
            title: cell(title_col),
            registry_url: cell(url_col),
            references: extract_references(&cell(docs_col)),
        };
        rows.insert(id, row);
    }
    Ok(rows)
}
