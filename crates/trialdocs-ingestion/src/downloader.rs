//! Bulk downloader for the documents referenced by the CSV export.
//!
//! Files land in `<download_dir>/<trial id>/` and are named
//! `{author}{year}_{label}_{title}.pdf` from the bibliographic record. A failed
//! download is recorded and the run moves on. In [`DownloadTargets::OnlyEmpty`]
//! mode only trials whose directory already exists and holds no files are
//! retried.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use trialdocs_common::{BibliographicRecord, TrialId};

use crate::fetcher::FetchError;
use crate::tabular::TrialRow;

/// Placeholder for a file-name component with no usable characters.
pub const MISSING_COMPONENT: &str = "NA";

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Downloader settings.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub download_dir: PathBuf,
    pub timeout: Duration,
    /// Delay after every download attempt.
    pub pause: Duration,
    pub max_name_len: usize,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            timeout: Duration::from_secs(60),
            pause: Duration::from_millis(100),
            max_name_len: 80,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Which trials a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTargets {
    /// Every trial in the CSV.
    All,
    /// Trials whose directory exists under the download root but is empty.
    OnlyEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFailure {
    pub nct: TrialId,
    pub url: String,
    pub error: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Target identifiers with no CSV row.
    pub skipped_missing: usize,
    pub failures: Vec<DownloadFailure>,
}

impl DownloadSummary {
    /// Write the failure list as pretty JSON. Nothing is written when there were no failures.
    pub fn write_report(&self, path: &Path) -> Result<bool> {
        if self.failures.is_empty() {
            return Ok(false);
        }
        let json = serde_json::to_string_pretty(&self.failures)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(true)
    }
}

pub struct Downloader {
    client: reqwest::Client,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Download documents for the selected trials.
    #[instrument(skip(self, rows, bibliography))]
    pub async fn run(
        &self,
        rows: &HashMap<TrialId, TrialRow>,
        bibliography: &HashMap<TrialId, BibliographicRecord>,
        targets: DownloadTargets,
    ) -> Result<DownloadSummary> {
        let ids: Vec<TrialId> = match targets {
            DownloadTargets::All => {
                let mut ids: Vec<TrialId> = rows.keys().cloned().collect();
                ids.sort();
                ids
            }
            DownloadTargets::OnlyEmpty => find_empty_trial_dirs(&self.config.download_dir)?,
        };
        info!(n_targets = ids.len(), "Starting download run");

        let mut summary = DownloadSummary::default();
        for id in ids {
            let Some(row) = rows.get(&id) else {
                summary.skipped_missing += 1;
                continue;
            };
            if row.references.is_empty() {
                debug!(nct = %id, "No parsable documents in CSV row");
                continue;
            }
            self.download_trial(row, bibliography.get(&id), &mut summary)
                .await?;
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped_missing = summary.skipped_missing,
            "Download run complete"
        );
        Ok(summary)
    }

    async fn download_trial(
        &self,
        row: &TrialRow,
        record: Option<&BibliographicRecord>,
        summary: &mut DownloadSummary,
    ) -> Result<()> {
        let folder = self.config.download_dir.join(row.id.as_str());
        tokio::fs::create_dir_all(&folder)
            .await
            .with_context(|| format!("failed to create {}", folder.display()))?;

        for reference in &row.references {
            if !reference
                .url
                .get(..4)
                .is_some_and(|h| h.eq_ignore_ascii_case("http"))
            {
                continue;
            }
            let file_name = document_file_name(record, &reference.label, self.config.max_name_len);
            let path = folder.join(&file_name);

            match self.download_one(&reference.url, &path).await {
                Ok(bytes) => {
                    info!(nct = %row.id, file = %file_name, bytes, "Downloaded");
                    summary.succeeded += 1;
                }
                Err(e) => {
                    warn!(nct = %row.id, url = %reference.url, error = %e, "Download failed");
                    summary.failed += 1;
                    summary.failures.push(DownloadFailure {
                        nct: row.id.clone(),
                        url: reference.url.clone(),
                        error: e.to_string(),
                    });
                }
            }

            tokio::time::sleep(self.config.pause).await;
        }
        Ok(())
    }

    async fn download_one(&self, url: &str, path: &Path) -> Result<usize, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = resp.bytes().await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(bytes.len())
    }
}

/// Make `name` safe for use in a file name.
///
/// Runs of characters outside `[A-Za-z0-9._-]` become a single `_`, the
/// result is cut to `max_len` characters and stripped of leading and trailing
/// `.`, `_` and `-`. An empty result becomes [`MISSING_COMPONENT`].
pub fn safe_component(name: &str, max_len: usize) -> String {
    let cleaned = lazy_unsafe_chars_regex().replace_all(name.trim(), "_");
    // Only ASCII survives the replacement, so byte length equals char length.
    let cut = &cleaned[..cleaned.len().min(max_len)];
    let stripped = cut.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    if stripped.is_empty() {
        MISSING_COMPONENT.to_string()
    } else {
        stripped.to_string()
    }
}

/// `{author}{year}_{label}_{title}.pdf`, every component sanitised.
pub fn document_file_name(
    record: Option<&BibliographicRecord>,
    label: &str,
    max_len: usize,
) -> String {
    let (author, year, title) = record
        .map(|r| (r.first_author.as_str(), r.year.as_str(), r.title.as_str()))
        .unwrap_or(("", "", ""));
    format!(
        "{}{}_{}_{}.pdf",
        safe_component(author, max_len),
        safe_component(year, max_len),
        safe_component(label, max_len),
        safe_component(title, max_len),
    )
}

/// Normalised identifiers of the existing sub-directories of `root` that contain no files.
///
/// Sub-directories inside a trial directory do not count as files. A missing
/// root yields an empty list.
pub fn find_empty_trial_dirs(root: &Path) -> Result<Vec<TrialId>> {
    if !root.is_dir() {
        warn!(root = %root.display(), "Download root not found");
        return Ok(Vec::new());
    }

    let mut empties = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let mut has_file = false;
        for inner in std::fs::read_dir(&path)? {
            if inner?.path().is_file() {
                has_file = true;
                break;
            }
        }
        if !has_file {
            empties.push(TrialId::normalize(&entry.file_name().to_string_lossy()));
        }
    }

    empties.sort();
    empties.dedup();
    Ok(empties)
}

fn lazy_unsafe_chars_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"[^a-zA-Z0-9._-]+").unwrap())
}
