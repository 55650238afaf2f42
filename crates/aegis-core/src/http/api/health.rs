//! `GET /health`: component statuses. The teacher's own `/health` route is
//! a static liveness string (`daemon/http/router.rs`); this widens it into
//! the per-collaborator `HealthChecker` shape from `daemon/health.rs`,
//! covering every collaborator this service depends on instead of just the
//! daemon process itself.

use std::sync::Arc;

use aegis_models::ComponentHealth;
use axum::{Extension, Json};

use crate::AppCore;

pub async fn health_check(Extension(core): Extension<Arc<AppCore>>) -> Json<Vec<ComponentHealth>> {
    Json(core.health().await)
}
