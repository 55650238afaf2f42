//! The HTTP surface's listener lifecycle. Generalises the teacher's
//! `daemon/http/server.rs` `HttpConfig`/`HttpServer` pair: same
//! bind/graceful-shutdown shape, no auth layer (TLS/auth for the outward API
//! is an explicit non-goal here).

use std::sync::Arc;

use axum::Router;
use tokio::sync::broadcast;
use tracing::info;

use crate::error::{AegisError, Result};
use crate::AppCore;

use super::router;

const SERVICE_PORT_ENV: &str = "AGENT_SERVICE_PORT";

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let port = std::env::var(SERVICE_PORT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8787);
        Self {
            host: "127.0.0.1".to_string(),
            port,
            cors_origins: vec!["*".to_string()],
        }
    }
}

pub struct HttpServer {
    config: HttpConfig,
    core: Arc<AppCore>,
}

impl HttpServer {
    pub fn new(config: HttpConfig, core: Arc<AppCore>) -> Self {
        Self { config, core }
    }

    fn build_router(&self) -> Router {
        router::build_router(self.core.clone(), &self.config)
    }

    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let app = self.build_router();
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AegisError::Internal(format!("failed to bind {addr}: {e}")))?;
        info!(addr, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| AegisError::Internal(e.to_string()))?;

        Ok(())
    }
}
