use std::sync::Arc;

use chatcast_core::config::ChatcastConfig;
use chatcast_gateway::app;
use clap::Parser;
use tracing::{info, warn};

/// Broadcast chat over HTTP and Server-Sent Events.
#[derive(Debug, Parser)]
#[command(name = "chatcast-gateway", version)]
struct Args {
    /// Path to chatcast.toml (defaults to ~/.chatcast/chatcast.toml).
    #[arg(long, env = "CHATCAST_CONFIG")]
    config: Option<String>,

    /// Override `gateway.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chatcast_gateway=info,chatcast_broadcast=info,tower_http=debug".into()
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ChatcastConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ChatcastConfig::default()
    });
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    let addr = config.gateway.socket_addr()?;
    let state = Arc::new(app::AppState::new(config));

    // Ctrl-C cancels the shared token: open streams end, then the server drains.
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            return;
        }
        info!("received Ctrl-C");
        shutdown.cancel();
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Chatcast gateway listening on {}", addr);

    app::serve(listener, state).await?;
    info!("Chatcast gateway stopped");
    Ok(())
}
