//! trialdocs-llm: chat-completion and embedding client abstraction.

pub mod backend;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OpenAiBackend};
