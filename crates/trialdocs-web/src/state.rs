//! Shared application state for the web server.

use std::sync::Arc;

use trialdocs_rag::AnswerService;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub answers: Arc<AnswerService>,
}

impl AppState {
    pub fn new(answers: Arc<AnswerService>) -> Self {
        Self { answers }
    }
}

pub type SharedState = Arc<AppState>;
