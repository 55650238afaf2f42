//! Maps `AegisError` onto the HTTP status codes named in the error handling
//! design: 400 for user input, 403 for governance denial, 502 for an
//! unreachable upstream, 429 for exhausted resources, 499 for a cancelled
//! request (nonstandard, but the code the original spec calls for), 500
//! otherwise. Mirrors the teacher's `ApiError` shape (`daemon/http/error.rs`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AegisError, ErrorKind};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    /// The request's trace id, when one had already been created —
    /// §7 "the trace_id is always exposed to the user so they can
    /// self-serve diagnostics." Absent for errors raised before a trace
    /// exists (e.g. an unparseable query string on `/sessions`).
    trace_id: Option<Uuid>,
}

fn cancelled_status() -> StatusCode {
    StatusCode::from_u16(499).expect("499 is a valid status code")
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: format!("{} not found", what.into()),
            trace_id: None,
        }
    }

    /// Attach the in-flight request's trace id so the caller can self-serve
    /// diagnostics via `agent telemetry trace <id>`.
    pub fn with_trace(mut self, trace_id: Uuid) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl From<AegisError> for ApiError {
    fn from(err: AegisError) -> Self {
        let status = match err.kind() {
            ErrorKind::UserInput | ErrorKind::ParseFailure => StatusCode::BAD_REQUEST,
            ErrorKind::PolicyDenied => StatusCode::FORBIDDEN,
            ErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ErrorKind::ResourceExhaustion => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Cancelled => cancelled_status(),
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            trace_id: None,
        }
    }
}

impl From<aegis_storage::StorageError> for ApiError {
    fn from(err: aegis_storage::StorageError) -> Self {
        AegisError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "trace_id": self.trace_id,
            }
        }));
        (self.status, body).into_response()
    }
}
