use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("sink '{0}' unavailable")]
    SinkUnavailable(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
