//! Exploding Kittens Duel Server
//!
//! Serves one two-player game over WebSocket until Ctrl-C.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kittens::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Kittens Server v{}", VERSION);

    let config = ServerConfig::from_env();
    info!("Send logs: {}", config.send_logs);

    let server = GameServer::bind(config.clone())
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            shutdown.shutdown();
        }
    });

    server.run().await?;
    info!("Server stopped");

    Ok(())
}
