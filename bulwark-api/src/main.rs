//! # Bulwark API Server
//!
//! A minimal hardened HTTP API: security headers, CORS, per-client rate
//! limiting and input validation around a single test endpoint.
//!
//! ## Usage
//!
//! ```bash
//! PORT=3000 ALLOWED_ORIGINS=http://localhost:3000 cargo run -p bulwark-api
//! ```
//!
//! Set `APP_ENV=production` or `TRUST_PROXY=true` when running behind a
//! reverse proxy so client addresses are taken from `X-Forwarded-For`.

use bulwark_api::{
    app::{build_router, spawn_rate_limit_purge, AppState},
    config::Config,
    telemetry,
};
use bulwark_shared::env::ProcessEnv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let _log_guard = telemetry::init(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_addr = %config.bind_address(),
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        log_dir = ?config.logging.dir,
        "Bulwark API server starting"
    );

    let bind_address = config.bind_address();
    let state = AppState::new(config, Arc::new(ProcessEnv));

    let purge = spawn_rate_limit_purge(&state);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    purge.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }

    tracing::info!("Shutdown signal received, draining connections");
}
