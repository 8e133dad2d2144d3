//! Question answering endpoint.

use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Trial identifier in any spelling; normalized by the orchestrator.
    pub nct: String,
    pub question: String,
}

/// POST /chat - `{nct, question}` → `{answer, meta}`
pub async fn chat(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(nct = %payload.nct, question_len = payload.question.len(), "Chat request");
    let answer = state.answers.answer(&payload.nct, &payload.question).await?;
    Ok(Json(answer))
}
