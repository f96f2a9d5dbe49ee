use anyhow::{Context, Result};
use colored::*;
use roomcall_relay::{RelayConfig, RelayHub, router};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

pub struct ServeArgs {
    pub config: Option<PathBuf>,
    pub bind: Option<String>,
    pub room_capacity: Option<usize>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("Failed to load relay config {}", path.display()))?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(capacity) = args.room_capacity {
        config.room_capacity = capacity;
    }
    config.validate().context("Invalid relay config")?;

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    let addr = listener.local_addr()?;

    println!(
        "{} ws://{}/ws (room capacity {})",
        "📡 Relay listening on".green().bold(),
        addr,
        config.room_capacity
    );

    let app = router(RelayHub::new(config.room_capacity));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Relay server failed")?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        println!("{}", "Shutting down relay...".yellow());
    }
}
