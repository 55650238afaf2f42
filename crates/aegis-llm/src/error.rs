use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm http error ({provider}, status {status}): {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("llm request error: {0}")]
    Request(String),

    #[error("llm response did not match the expected schema: {0}")]
    SchemaMismatch(String),

    #[error("llm call timed out after {0}ms")]
    Timeout(u64),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http { status, .. } => *status >= 500 || *status == 429,
            LlmError::Request(_) | LlmError::Timeout(_) => true,
            LlmError::SchemaMismatch(_) => false,
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            LlmError::Http {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
