//! The HTTP surface (C9's request path plus session/chat): axum router,
//! error mapping, and the listener lifecycle. Generalises the teacher's
//! `daemon/http/` subtree.

pub mod api;
mod cors;
pub mod error;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use server::{HttpConfig, HttpServer};
