//! `POST /sessions` and `GET /sessions/{id}`. Generalises the teacher's
//! `daemon/http/api/sessions.rs`: same create/fetch shape, narrowed to the
//! two operations named in the interface (no list/search/delete — nothing
//! here exposes those).

use std::sync::Arc;

use aegis_models::{Mode, Session};
use axum::extract::Path;
use axum::{Extension, Json};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AegisError;
use crate::http::ApiError;
use crate::AppCore;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session))
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    channel: String,
    mode: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    session_id: Uuid,
    channel: String,
    mode: Mode,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn parse_mode(raw: &str) -> Result<Mode, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_uppercase())).map_err(|_| {
        ApiError::from(AegisError::UserInput(format!("unknown mode '{raw}'")))
    })
}

async fn create_session(
    Extension(core): Extension<Arc<AppCore>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    if req.channel.trim().is_empty() {
        return Err(AegisError::UserInput("channel must not be empty".to_string()).into());
    }
    let mode = parse_mode(&req.mode)?;

    let session = Session::new(req.channel, mode);
    core.session_store.put(&session).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.session_id,
            channel: session.channel,
            mode: session.mode,
            created_at: session.created_at,
        }),
    ))
}

async fn get_session(
    Extension(core): Extension<Arc<AppCore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = core
        .session_store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("session"))?;
    Ok(Json(session))
}
