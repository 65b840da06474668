//! Repbook Server
//!
//! Serves the workout API and stores each user's workouts in a key-value
//! store.
//!
//! # Configuration
//!
//! Environment variables:
//! - `REPBOOK_PORT`: Port to listen on (default: 8080)
//! - `REPBOOK_STORE`: `memory`, `sqlite` or `redis` (default: sqlite)
//! - `REPBOOK_DATA_DIR`: Directory for the SQLite database (default: ~/.local/share/repbook-server)
//! - `REPBOOK_REDIS_URL`: Redis URL (default: redis://127.0.0.1:6379)
//! - `REPBOOK_SESSION_TTL_DAYS`: Session lifetime in days (default: 7)
//! - `REPBOOK_SECURE_COOKIES`: Mark the session cookie `Secure` (default: false)
//! - `REPBOOK_CONFIG`: Path to config file (default: ~/.config/repbook-server/config.yaml)
//!
//! Environment variables take priority over the config file.

use std::net::SocketAddr;

use repbook::server::{app, store, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }
    tracing::info!("Store: {}", config.store);

    let store = store::open(&config).await?;
    let state = AppState::new(store, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repbook=info,repbook_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
