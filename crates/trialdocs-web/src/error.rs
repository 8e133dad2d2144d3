//! JSON error responses for the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use trialdocs_rag::RagError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The embedding or generation service did not answer in time.
    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    /// The embedding or generation service answered with an error.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(_)        => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_)        => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RagError> for ApiError {
    fn from(e: RagError) -> Self {
        match e {
            e if e.is_timeout() => ApiError::UpstreamTimeout(e.to_string()),
            e @ (RagError::Embedding(_) | RagError::Generation(_)) => ApiError::Upstream(e.to_string()),
            e @ RagError::Json(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(_) => error!(error = %self, "Request failed"),
            _ => warn!(status = status.as_u16(), error = %self, "Upstream call failed"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
