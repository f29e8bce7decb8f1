//! Signaling relay entry point

use clap::Parser;
use duet_signaling::{ServerConfig, ServerState, serve};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();
    init_tracing(&config.log_filter);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        "signaling relay listening"
    );

    let state = ServerState::new();
    tokio::select! {
        () = serve(listener, state) => {}
        _ = tokio::signal::ctrl_c() => info!("Ctrl+C received, shutting down"),
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    // RUST_LOG wins over the configured default
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
