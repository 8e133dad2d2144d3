//! Document retrieval and text extraction.
//!
//! A source is either a remote URL or a file already on disk. Remote bodies
//! are written to a named temporary file for the duration of parsing only;
//! the file is created and dropped inside one blocking task, so it is gone
//! on success, on parse failure and on panic alike. Retrieval failures happen
//! before any file exists.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::pdf_parser;

/// Per-document failure. Callers treat these as isolated to one source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable PDF: {0}")]
    Pdf(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(e)
        }
    }
}

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentSource {
    Remote(String),
    Local(PathBuf),
}

impl DocumentSource {
    /// Strings starting with `http` (any case) are remote; anything else is a path.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let is_remote = trimmed
            .get(..4)
            .is_some_and(|head| head.eq_ignore_ascii_case("http"));
        if is_remote {
            DocumentSource::Remote(trimmed.to_string())
        } else {
            DocumentSource::Local(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Remote(url) => f.write_str(url),
            DocumentSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches a document and returns its plain text.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_text(&self, source: &DocumentSource) -> Result<String, FetchError>;
}

/// reqwest + lopdf implementation of [`DocumentFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    scratch_dir: Option<PathBuf>,
}

impl HttpFetcher {
    pub const USER_AGENT: &'static str = concat!("trialdocs/", env!("CARGO_PKG_VERSION"));

    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(Self::USER_AGENT)
            .build()?;
        Ok(Self { client, scratch_dir: None })
    }

    /// Create temporary files under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let pdf_bytes = resp.bytes().await?;
        debug!(url, bytes = pdf_bytes.len(), "Document downloaded");

        let scratch_dir = self.scratch_dir.clone();
        tokio::task::spawn_blocking(move || -> Result<String, FetchError> {
            // lopdf loads from a path; the temp file lives only inside this closure.
            let mut builder = tempfile::Builder::new();
            builder.prefix("trialdocs-").suffix(".pdf");
            let mut temp_file = match &scratch_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            std::io::Write::write_all(&mut temp_file, &pdf_bytes)?;
            parse_file(temp_file.path())
        })
        .await
        .map_err(|e| FetchError::Io(std::io::Error::other(e)))?
    }

    async fn read_local(&self, path: &Path) -> Result<String, FetchError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<String, FetchError> {
            if !path.is_file() {
                return Err(FetchError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} is not a file", path.display()),
                )));
            }
            parse_file(&path)
        })
        .await
        .map_err(|e| FetchError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    #[instrument(skip(self), fields(source = %source))]
    async fn fetch_text(&self, source: &DocumentSource) -> Result<String, FetchError> {
        let text = match source {
            DocumentSource::Remote(url) => self.fetch_remote(url).await?,
            DocumentSource::Local(path) => self.read_local(path).await?,
        };
        info!(chars = text.len(), "Document text extracted");
        Ok(text)
    }
}

fn parse_file(path: &Path) -> Result<String, FetchError> {
    pdf_parser::extract_text(path).map_err(|e| FetchError::Pdf(format!("{e:#}")))
}
