//! The core's own error enum, mapping onto the seven-kind taxonomy from the
//! error handling design: `UserInputError`, `PolicyDenied`,
//! `UpstreamUnavailable`, `ParseFailure`, `ResourceExhaustion`, `Cancelled`,
//! `Internal`. One `thiserror` enum at this crate boundary; `anyhow` is
//! reserved for the CLI/HTTP glue layer, never used inside this crate.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserInput,
    PolicyDenied,
    UpstreamUnavailable,
    ParseFailure,
    ResourceExhaustion,
    Cancelled,
    Internal,
}

#[derive(Debug, Error)]
pub enum AegisError {
    #[error("invalid request: {0}")]
    UserInput(String),

    #[error("denied by governance: {0}")]
    PolicyDenied(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("failed to parse: {0}")]
    ParseFailure(String),

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AegisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AegisError::UserInput(_) => ErrorKind::UserInput,
            AegisError::PolicyDenied(_) => ErrorKind::PolicyDenied,
            AegisError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            AegisError::ParseFailure(_) => ErrorKind::ParseFailure,
            AegisError::ResourceExhaustion(_) => ErrorKind::ResourceExhaustion,
            AegisError::Cancelled => ErrorKind::Cancelled,
            AegisError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable short code for the `{error: {code, message, trace_id}}`
    /// response payload of §7.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::UserInput => "user_input_error",
            ErrorKind::PolicyDenied => "policy_denied",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::ResourceExhaustion => "resource_exhaustion",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl From<aegis_traits::TraitError> for AegisError {
    fn from(err: aegis_traits::TraitError) -> Self {
        match err {
            aegis_traits::TraitError::ToolNotFound(name) => {
                AegisError::UserInput(format!("tool '{name}' not found"))
            }
            aegis_traits::TraitError::ToolExecutionFailed { tool, message } => {
                AegisError::UpstreamUnavailable(format!("tool '{tool}' failed: {message}"))
            }
            aegis_traits::TraitError::LlmRequestFailed(provider, message) => {
                AegisError::UpstreamUnavailable(format!("{provider}: {message}"))
            }
            aegis_traits::TraitError::StoreFailed(message) => AegisError::Internal(message),
            aegis_traits::TraitError::ApprovalUnavailable(message) => {
                AegisError::PolicyDenied(message)
            }
            aegis_traits::TraitError::Serde(err) => AegisError::ParseFailure(err.to_string()),
            aegis_traits::TraitError::Other(message) => AegisError::Internal(message),
        }
    }
}

impl From<aegis_storage::StorageError> for AegisError {
    fn from(err: aegis_storage::StorageError) -> Self {
        AegisError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AegisError>;
