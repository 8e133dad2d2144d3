//! LLM backend trait and the OpenAI-compatible implementation.
//!
//! One backend covers both calls the answer pipeline makes:
//!   chat completions: `POST {base_url}/chat/completions`
//!   embeddings:       `POST {base_url}/embeddings`
//!
//! Any server speaking the OpenAI wire format works (OpenAI itself, vLLM,
//! LMStudio, OpenRouter, ...). The API key is optional for local servers.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e)
        }
    }
}

impl LlmError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout)
    }
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    /// One vector per input, in input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError>;
    fn model_id(&self) -> &str;
    fn embedding_model_id(&self) -> &str;
}

// ── Helpers: OpenAI wire format ──────────────────────────────────────────────

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}

/// Embeddings from a `/embeddings` body, ordered by their `index` field.
fn parse_embeddings(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, LlmError> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| LlmError::InvalidResponse("missing 'data' array".into()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
        let vector: Vec<f32> = serde_json::from_value(item["embedding"].clone())?;
        indexed.push((index, vector));
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    let body: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(_) if status >= 400 => serde_json::Value::String(text),
        Err(e) => return Err(LlmError::Serde(e)),
    };
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .or_else(|| body.as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

// ── OpenAI-compatible backend ────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key,
            client,
        })
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k.expose_secret()),
            None    => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    #[instrument(skip(self, req), fields(n_messages = req.messages.len()))]
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    req.messages,
            "temperature": req.temperature.unwrap_or(0.1),
        });
        if let Some(max_tokens) = req.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }
        let resp = self
            .auth(self.client.post(self.endpoint("chat/completions")))
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        let out = parse_openai_response(&json, &self.model);
        debug!(
            prompt_tokens = out.prompt_tokens,
            completion_tokens = out.completion_tokens,
            "Completion received"
        );
        Ok(out)
    }

    #[instrument(skip(self, texts), fields(n = texts.len(), model = %self.embedding_model))]
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = serde_json::json!({"model": &self.embedding_model, "input": texts});
        let resp = self
            .auth(self.client.post(self.endpoint("embeddings")))
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_embeddings(&json)
    }

    fn model_id(&self) -> &str { &self.model }
    fn embedding_model_id(&self) -> &str { &self.embedding_model }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
