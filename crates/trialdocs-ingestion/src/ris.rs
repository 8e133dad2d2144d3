//! RIS (tag-value) bibliographic export parsing.
//!
//! Each line is `TG  - value`: a two-character tag, then the value starting at
//! column 6. A `TY` tag opens a new record. Lines with a blank tag (continuations,
//! blank lines) are ignored. Records are keyed by the normalised `ID` tag; a
//! later record with the same identifier replaces the earlier one.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};
use trialdocs_common::error::Result;
use trialdocs_common::{BibliographicRecord, TrialId};

const TAG_WIDTH: usize = 2;
const VALUE_OFFSET: usize = 6;

const RECORD_START: &str = "TY";
const TAG_ID: &str = "ID";
const TAG_TITLE: &str = "TI";
const TAG_YEAR: &str = "PY";
const TAG_AUTHOR: &str = "AU";

/// Load a RIS file. A missing file is not an error: it yields an empty map.
pub fn load_ris(path: &Path) -> Result<HashMap<TrialId, BibliographicRecord>> {
    if !path.exists() {
        info!(path = %path.display(), "RIS file not found, continuing without bibliographic data");
        return Ok(HashMap::new());
    }
    let bytes = std::fs::read(path)?;
    let records = parse_ris(&String::from_utf8_lossy(&bytes));
    info!(path = %path.display(), n = records.len(), "RIS metadata loaded");
    Ok(records)
}

/// Parse RIS text in a single pass.
pub fn parse_ris(text: &str) -> HashMap<TrialId, BibliographicRecord> {
    let mut out = HashMap::new();
    let mut current: HashMap<String, String> = HashMap::new();

    for line in text.lines() {
        let (tag, value) = split_line(line);
        if tag.is_empty() {
            continue;
        }
        if tag == RECORD_START && !current.is_empty() {
            flush(&mut current, &mut out);
        }
        current.insert(tag.to_string(), value.to_string());
    }
    flush(&mut current, &mut out);

    out
}

/// Split a line into its trimmed tag and trimmed value (character columns, not bytes).
fn split_line(line: &str) -> (&str, &str) {
    let tag_end = byte_offset(line, TAG_WIDTH);
    let value_start = byte_offset(line, VALUE_OFFSET);
    (line[..tag_end].trim(), line[value_start..].trim())
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

fn flush(
    current: &mut HashMap<String, String>,
    out: &mut HashMap<TrialId, BibliographicRecord>,
) {
    let record = std::mem::take(current);
    let Some(raw_id) = record.get(TAG_ID) else {
        if !record.is_empty() {
            debug!("Discarding RIS record without an ID tag");
        }
        return;
    };

    let identifier = TrialId::normalize(raw_id);
    let field = |tag: &str| record.get(tag).cloned().unwrap_or_default();
    let first_author = record
        .get(TAG_AUTHOR)
        .and_then(|au| au.split(',').next())
        .unwrap_or("")
        .to_string();

    out.insert(
        identifier.clone(),
        BibliographicRecord {
            identifier,
            title: field(TAG_TITLE),
            year: field(TAG_YEAR),
            first_author,
        },
    );
}
