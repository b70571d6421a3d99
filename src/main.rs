//! wallet-tracker-gateway server entry point.
//!
//! Loads configuration, opens the store, and serves the HTTP API.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use wallet_tracker_gateway::api;
use wallet_tracker_gateway::app_state::AppState;
use wallet_tracker_gateway::auth::WalletAuthenticator;
use wallet_tracker_gateway::config::{GatewayConfig, LogFormat};
use wallet_tracker_gateway::persistence::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting wallet-tracker-gateway");

    // Build persistence layer
    let store = if config.persistence_enabled {
        Store::postgres(&config.postgres_settings())
            .await
            .context("failed to open PostgreSQL store")?
    } else {
        tracing::warn!("persistence disabled; records are kept in memory only");
        Store::in_memory()
    };
    tracing::info!(backend = store.backend(), "store ready");

    // Build application state
    let authenticator = WalletAuthenticator::new(config.auth_policy());
    let app_state = AppState::new(store, authenticator, config.referral_base_url.clone());

    // Build router
    let app = api::build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
