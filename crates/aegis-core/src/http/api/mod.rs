pub mod chat;
pub mod health;
pub mod sessions;

use axum::Router;

/// Build the request-handling surface: `/sessions` and `/chat`. `/health`
/// is mounted directly by the parent router since it has no sub-routes.
pub fn router() -> Router {
    Router::new()
        .nest("/sessions", sessions::router())
        .merge(chat::router())
}
