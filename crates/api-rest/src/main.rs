//! Standalone REST gateway binary.
//!
//! ## Purpose
//! Runs the serolab JSON gateway on its own.
//!
//! ## Intended use
//! Useful during development when the gateway is run without the workspace's main `serolab-run`
//! launcher (which additionally loads `.env`).

use serolab_core::CoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the serolab REST gateway
///
/// # Environment Variables
/// - `SEROLAB_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SEROLAB_API_BASE_URL`, `SEROLAB_REQUEST_TIMEOUT_SECS`, `SEROLAB_RESULTS_ORIGIN`,
///   `SEROLAB_CATALOG_FILE`: see [`CoreConfig::from_lookup`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or catalog is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("SEROLAB_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting serolab REST gateway on {}", addr);

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!("-- Forwarding to lab backend at {}", cfg.api_base_url());

    let app = api_rest::router(api_rest::AppState::new(cfg)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
