//! Beacon Risk API Server
//!
//! REST API for MSME risk assessment with tiered ML fallback
//!
//! Usage:
//!   cargo run --bin beacon_api
//!
//! Environment:
//!   PORT / BEACON_PORT        - Server port (default: 5001)
//!   BEACON_HOST               - Server host (default: 0.0.0.0)
//!   ML_SERVICE_URL            - ML prediction service base URL (default: http://localhost:8000)
//!   ML_SERVICE_TIMEOUT_MS     - Interactive predictor timeout (default: 5000)
//!   ML_BATCH_TIMEOUT_MS       - Batch / model-only predictor timeout (default: 10000)
//!   BEACON_BATCH_CONCURRENCY  - Default batch concurrency (default: 10, max: 50)
//!   RUST_LOG                  - Log level (default: info)

use beacon_risk::api::{create_router, handlers::AppState, start_cleanup_task};
use beacon_risk::utils::constants::{APP_NAME, APP_VERSION};
use beacon_risk::{EngineConfig, ServerConfig, TelemetryCollector};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    info!("🚀 {} API v{}", APP_NAME, APP_VERSION);

    let engine_config = EngineConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;

    let telemetry = Arc::new(TelemetryCollector::new());
    let state = Arc::new(AppState::from_config(&engine_config, telemetry.clone()));

    // Start background cleanup task for rate limiter
    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    let app = create_router(state);
    let addr = server_config.socket_addr()?;

    info!("🌐 {} listening on http://{}", APP_NAME, addr);
    info!("🔗 ML service endpoint: {}", engine_config.predict_endpoint());
    info!("Endpoints:");
    info!("  POST /api/risk/predict       - Tiered risk prediction (always answers)");
    info!("  POST /api/risk/predict-demo  - Model-only prediction (no fallback)");
    info!("  POST /api/risk/batch         - Batch assessment (up to 100 records)");
    info!("  GET  /api/risk/stats         - Assessment statistics");
    info!("  GET  /health                 - Health check");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    info!("📊 Final stats: {}", telemetry.get_stats().summary());
    info!("👋 {} API shutdown complete", APP_NAME);

    Ok(())
}
