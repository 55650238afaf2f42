//! The `aegisd` binary: boots one `AppCore`, spawns the Sensor Daemon and
//! Scheduler, and serves the HTTP surface until a shutdown signal arrives.
//! Grounded on the teacher's `daemon.rs` `run_daemon` shutdown-broadcast
//! shape (SIGTERM + ctrl-c both trip the same `broadcast::Sender<()>`),
//! minus the socket-lock/IPC-server machinery this service has no use for.

use std::sync::Arc;

use aegis_core::http::{HttpConfig, HttpServer};
use aegis_core::AppCore;
use tracing::{error, info};

fn init_logging() {
    let filter = std::env::var("AGENT_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let core = Arc::new(AppCore::new().await?);
    info!("aegis core initialized");

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    core.spawn_background_tasks(&shutdown_tx);

    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_signal.send(());
    });

    let server = HttpServer::new(HttpConfig::default(), core.clone());
    if let Err(err) = server.run(shutdown_tx.subscribe()).await {
        error!(error = %err, "HTTP server exited with an error");
        return Err(anyhow::anyhow!(err));
    }

    Ok(())
}
