//! `POST /chat?message=&session_id=&compress=`. Loads (or creates) the
//! session, runs it through the Task Executor, persists the updated
//! transcript, and maps the outcome onto the response shape named in the
//! interface. Generalises the teacher's chat-turn handlers in
//! `daemon/http/api/agents.rs`.

use std::sync::Arc;

use aegis_models::{Mode, Session, TaskState, TraceContext};
use axum::extract::Query;
use axum::{Extension, Json};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AegisError;
use crate::executor::compress::compress_transcript;
use crate::http::ApiError;
use crate::AppCore;

pub fn router() -> Router {
    Router::new().route("/chat", post(chat))
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    message: String,
    session_id: Option<Uuid>,
    #[serde(default)]
    compress: bool,
}

#[derive(Debug, Serialize)]
struct UsageResponse {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: Uuid,
    response: String,
    trace_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<UsageResponse>,
}

async fn chat(
    Extension(core): Extension<Arc<AppCore>>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<ChatResponse>, ApiError> {
    let trace = TraceContext::new();

    if query.message.trim().is_empty() {
        let err: ApiError = AegisError::UserInput("message must not be empty".to_string()).into();
        return Err(err.with_trace(trace.trace_id));
    }

    let mut session = match query.session_id {
        Some(id) => core
            .session_store
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("session").with_trace(trace.trace_id))?,
        None => Session::new("CHAT", Mode::Normal),
    };

    if query.compress {
        session.messages = compress_transcript(std::mem::take(&mut session.messages));
    }

    let mode = core.mode_manager.current();
    // TODO: this only cancels on server shutdown; cancelling on client
    // disconnect needs the request future split off into its own task
    // with a drop-guard on the handler side, since axum gives handlers no
    // disconnect signal to select against directly.
    let cancellation = core.shutdown_token.child_token();

    let (outcome, session) = core
        .task_executor
        .run(&trace, session, &query.message, mode, cancellation)
        .await;

    if outcome.cancelled {
        let err: ApiError = AegisError::Cancelled.into();
        return Err(err.with_trace(trace.trace_id));
    }

    if outcome.state == TaskState::Failed && outcome.final_reply.is_none() {
        let err: ApiError = AegisError::UpstreamUnavailable(
            "the model could not complete this request".to_string(),
        )
        .into();
        return Err(err.with_trace(trace.trace_id));
    }

    let usage = if outcome.prompt_tokens > 0 || outcome.completion_tokens > 0 {
        Some(UsageResponse {
            prompt_tokens: outcome.prompt_tokens,
            completion_tokens: outcome.completion_tokens,
            total_tokens: outcome.prompt_tokens + outcome.completion_tokens,
        })
    } else {
        None
    };

    Ok(Json(ChatResponse {
        session_id: session.session_id,
        response: outcome
            .final_reply
            .unwrap_or_else(|| "no response produced".to_string()),
        trace_id: trace.trace_id,
        usage,
    }))
}
