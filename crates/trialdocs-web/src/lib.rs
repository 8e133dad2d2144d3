//! trialdocs-web: JSON API over the answer orchestrator.
//!   GET  /health   liveness probe
//!   POST /chat     answer one question about one trial

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, SharedState};
