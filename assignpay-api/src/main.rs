//! # AssignPay API Server
//!
//! Serves the assignment submission page's backend: account sign-up and
//! sign-in, the session-gated submission endpoint that records an assignment
//! and its simulated payment, and read-only views of what was recorded.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p assignpay-api
//! ```
//!
//! Without `DATABASE_URL` the server keeps everything in memory.

use assignpay_api::{
    app::{build_router, AppState},
    config::Config,
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "assignpay_api=debug,assignpay_shared=info,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "AssignPay API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let address = config.bind_address();
    let state = AppState::from_config(config).await?;
    tracing::info!(storage = state.storage_backend(), "Stores ready");

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
