use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use api_shared::HealthService;
use serolab_core::CoreConfig;

/// Main entry point for the serolab application
///
/// Loads `.env`, resolves the core configuration once and serves the JSON gateway until
/// Ctrl-C.
///
/// # Environment Variables
/// - `SEROLAB_REST_ADDR`: gateway address (default: "0.0.0.0:3000")
/// - `SEROLAB_API_BASE_URL`: lab backend base URL
/// - `SEROLAB_REQUEST_TIMEOUT_SECS`: backend request timeout
/// - `SEROLAB_RESULTS_ORIGIN`: origin encoded in printed barcodes
/// - `SEROLAB_CATALOG_FILE`: optional YAML catalog replacing the built-in one
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("serolab_run=info".parse()?)
                .add_directive("serolab_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("SEROLAB_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;

    tracing::info!("++ Starting serolab gateway on {}", rest_addr);
    tracing::info!("++ Lab backend: {}", cfg.api_base_url());
    tracing::info!("++ {}", HealthService::check_health().message);

    let app = router(AppState::new(cfg)?);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
        })
        .await?;

    tracing::info!("-- serolab gateway stopped");
    Ok(())
}
