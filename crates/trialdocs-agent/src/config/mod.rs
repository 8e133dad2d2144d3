//! Configuration loading for trialdocs.
//! Reads trialdocs.toml from the current directory or the path in TRIALDOCS_CONFIG.
//! Every field has a default, so a missing file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::info;
use trialdocs_common::error::{Result as CommonResult, TrialDocsError};
use trialdocs_ingestion::downloader::{DownloadConfig, BROWSER_USER_AGENT};
use trialdocs_llm::backend::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use trialdocs_rag::RagConfig;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub download: DownloadSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_ris_path")]
    pub ris_path: PathBuf,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_csv_path()     -> PathBuf { PathBuf::from("ctg-studies.csv") }
fn default_ris_path()     -> PathBuf { PathBuf::from("ctg-studies.ris") }
fn default_download_dir() -> PathBuf { PathBuf::from("downloads") }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            ris_path: default_ris_path(),
            download_dir: default_download_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to OPENAI_API_KEY when absent.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url()        -> String { DEFAULT_BASE_URL.to_string() }
fn default_chat_model()      -> String { DEFAULT_CHAT_MODEL.to_string() }
fn default_embedding_model() -> String { DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dim()   -> usize  { 1536 }
fn default_temperature()     -> f32    { 0.1 }
fn default_request_timeout() -> u64    { 60 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|k| !k.trim().is_empty()).map(SecretString::from))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_top_k()         -> usize { 8 }
fn default_chunk_chars()   -> usize { 700 }
fn default_chunk_overlap() -> usize { 120 }
fn default_max_sources()   -> usize { 5 }
fn default_fetch_timeout() -> u64   { 60 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_chars: default_chunk_chars(),
            chunk_overlap: default_chunk_overlap(),
            max_sources: default_max_sources(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "127.0.0.1:8000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_pause_millis")]
    pub pause_millis: u64,
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_pause_millis() -> u64    { 100 }
fn default_max_name_len() -> usize  { 80 }
fn default_user_agent()   -> String { BROWSER_USER_AGENT.to_string() }

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            pause_millis: default_pause_millis(),
            max_name_len: default_max_name_len(),
            user_agent: default_user_agent(),
        }
    }
}


impl Config {
    /// Load configuration from trialdocs.toml.
    /// Checks TRIALDOCS_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("TRIALDOCS_CONFIG")
            .unwrap_or_else(|_| "trialdocs.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    /// Read `path` (if it exists), apply environment overrides and validate.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config = Self::from_toml_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            info!(path = %path.display(), "Configuration loaded");
            config
        } else {
            info!(path = %path.display(), "No config file; using defaults");
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// OPENAI_API_KEY fills a missing key; TRIALDOCS_BIND replaces the bind address.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = var("OPENAI_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from);
        }
        if let Some(bind) = var("TRIALDOCS_BIND").filter(|b| !b.is_empty()) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> CommonResult<()> {
        let r = &self.retrieval;
        if r.chunk_overlap >= r.chunk_chars {
            return Err(TrialDocsError::Config(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_chars ({})",
                r.chunk_overlap, r.chunk_chars
            )));
        }
        if r.top_k == 0 {
            return Err(TrialDocsError::Config("retrieval.top_k must be at least 1".into()));
        }
        if r.max_sources == 0 {
            return Err(TrialDocsError::Config("retrieval.max_sources must be at least 1".into()));
        }
        if self.llm.embedding_dim == 0 {
            return Err(TrialDocsError::Config("llm.embedding_dim must be at least 1".into()));
        }
        Ok(())
    }

    pub fn rag_config(&self) -> RagConfig {
        RagConfig {
            top_k: self.retrieval.top_k,
            chunk_chars: self.retrieval.chunk_chars,
            chunk_overlap: self.retrieval.chunk_overlap,
            max_sources: self.retrieval.max_sources,
            embedding_dim: self.llm.embedding_dim,
            temperature: self.llm.temperature,
        }
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            download_dir: self.data.download_dir.clone(),
            timeout: self.fetch_timeout(),
            pause: Duration::from_millis(self.download.pause_millis),
            max_name_len: self.download.max_name_len,
            user_agent: self.download.user_agent.clone(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval.fetch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_secs)
    }
}
