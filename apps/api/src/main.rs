use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use scheduling_cell::services::{MapsHandle, SlotOptimizer};
use shared_config::AppConfig;

const DEFAULT_PORT: u16 = 3000;

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn listen_port() -> u16 {
    match std::env::var("PORT").map(|value| value.parse::<u16>()) {
        Ok(Ok(port)) => port,
        Ok(Err(e)) => {
            warn!("Invalid PORT value ({}), using {}", e, DEFAULT_PORT);
            DEFAULT_PORT
        }
        Err(_) => DEFAULT_PORT,
    }
}

/// Builds the optimizer with a maps client created once at startup.
async fn build_optimizer(config: &AppConfig) -> Arc<SlotOptimizer> {
    let maps = Arc::new(MapsHandle::new(config));
    if !config.is_maps_configured() {
        warn!("Maps provider not configured, optimization requests will be rejected");
    } else if let Err(e) = maps.initialize().await {
        warn!("Maps client unavailable, optimization requests will be rejected: {}", e);
    }

    if !config.is_calendar_configured() {
        warn!("Calendar access token missing, every worker calendar fetch will fail");
    }

    Arc::new(SlotOptimizer::from_config(config, maps))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Starting collection scheduler API server");

    let config = AppConfig::from_env();
    let optimizer = build_optimizer(&config).await;

    let app = router::create_router(optimizer);

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port()));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
