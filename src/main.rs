use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::{info, warn};

mod config;
mod dashboard;
mod neatqueue;

use config::Config;
use dashboard::AppState;
use neatqueue::NeatQueueClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let client = NeatQueueClient::new(config.client_config()?)?;
    let status_message = config.status_message();
    if client.is_configured() {
        info!("{}", status_message);
    } else {
        warn!("{}", status_message);
    }

    let cancel = client.cancellation_token();
    let app = dashboard::router(AppState {
        client,
        status_message,
    });

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve until Ctrl-C; in-flight probes stop at their next candidate
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
            cancel.cancel();
        })
        .await?;

    Ok(())
}
