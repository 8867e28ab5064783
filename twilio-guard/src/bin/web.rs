//! Twilio Guard Web Server - guarded Twilio webhook receiver.
//!
//! This binary:
//! - Opens the caller blacklist database and creates its table
//! - Serves `/sms` (POST) and `/voice` (GET) behind the request guard
//! - Serves an unguarded `/health` endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use twilio_guard::web::{create_router, AppState};
use twilio_guard::{Config, SqliteBlacklist};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        debug = config.debug,
        account_uri = %config.account_uri(),
        auth_token_configured = config.has_auth_token(),
        public_base_url = ?config.public_base_url,
        "config_loaded"
    );

    if config.debug {
        warn!("twilio_signature_checks_disabled");
    } else if !config.has_auth_token() {
        warn!("twilio_auth_token_missing_all_posts_forbidden");
    }

    // Open the caller blacklist
    let blacklist = SqliteBlacklist::connect(&config.database_url)
        .await
        .context("Failed to open blacklist database")?;
    blacklist
        .migrate()
        .await
        .context("Failed to create callers table")?;
    info!("blacklist_store_ready");

    // Build the router
    let state = AppState::new(config.clone(), Arc::new(blacklist.clone()));
    let app = create_router(&state).context("Failed to configure routes")?;

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    blacklist.db_pool.close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
