mod config;
mod ecs;
mod inventory;
mod network;
mod tick;

use config::ServerConfig;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Blockwright server...");

    let config = Arc::new(ServerConfig::load(Path::new("config/server.toml"))?);
    info!(
        "Config loaded: bind={}:{}, max_players={}, online_mode={}",
        config.bind, config.port, config.max_players, config.online_mode
    );

    // Channel for new players entering play state.
    let (new_player_tx, new_player_rx) = mpsc::unbounded_channel::<tick::NewPlayer>();

    // Player count for status responses.
    let player_count = Arc::new(AtomicUsize::new(0));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let ctrlc_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
        let _ = ctrlc_tx.send(true);
    });

    let tick_config = config.clone();
    let tick_player_count = player_count.clone();

    tokio::select! {
        _ = tick::run_tick_loop(tick_config, new_player_rx, tick_player_count, shutdown_rx) => {
            info!("Server shut down cleanly");
        }
        _ = accept_loop(listener, config, new_player_tx, player_count) => {
            error!("Accept loop exited unexpectedly");
        }
    }

    Ok(())
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    new_player_tx: mpsc::UnboundedSender<tick::NewPlayer>,
    player_count: Arc<AtomicUsize>,
) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let config = config.clone();
                let tx = new_player_tx.clone();
                let pc = player_count.clone();
                tokio::spawn(async move {
                    network::handle_connection(socket, config, tx, move || pc.load(std::sync::atomic::Ordering::Relaxed)).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
