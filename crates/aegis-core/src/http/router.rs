//! Top-level axum router: `/health`, `/sessions` and `/chat`, CORS and the
//! shared `AppCore` handle layered over everything. Mirrors the teacher's
//! `daemon/http/router.rs`, minus the auth middleware and static-file
//! fallback it adds for its bundled web UI — this service has neither, and
//! minus the `/api` prefix the teacher nests its resource routers under:
//! the interface named here puts `/sessions` and `/chat` at the root.

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};

use crate::AppCore;

use super::api;
use super::HttpConfig;

pub fn build_router(core: Arc<AppCore>, config: &HttpConfig) -> Router {
    let cors = super::cors::build_cors_layer(config);

    Router::new()
        .route("/health", get(api::health::health_check))
        .merge(api::router())
        .layer(cors)
        .layer(Extension(core))
}
