//! Shared error type for trait-boundary failures: a collaborator that can't
//! be reached, misbehaves, or rejects a call it was handed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraitError {
    #[error("tool '{0}' not found in registry")]
    ToolNotFound(String),

    #[error("tool '{tool}' failed: {message}")]
    ToolExecutionFailed { tool: String, message: String },

    #[error("llm provider '{0}' request failed: {1}")]
    LlmRequestFailed(String, String),

    #[error("store operation failed: {0}")]
    StoreFailed(String),

    #[error("approval channel unavailable: {0}")]
    ApprovalUnavailable(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TraitError>;
