//! Beacon Risk - one-shot assessment CLI
//!
//! Reads a business record (JSON object) from a file or stdin, runs the
//! tiered prediction protocol and prints the formatted assessment.
//!
//! Usage:
//!   beacon_risk record.json
//!   cat record.json | beacon_risk
//!
//! Environment:
//!   ML_SERVICE_URL        - ML prediction service base URL (default: http://localhost:8000)
//!   ML_SERVICE_TIMEOUT_MS - Predictor timeout (default: 5000)
//!   RUST_LOG              - Log level (default: info)

use beacon_risk::{format_now, EngineConfig, HttpPredictor, PredictionOrchestrator};
use eyre::{Result, WrapErr};
use serde_json::Value;
use std::io::Read;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let raw = match std::env::args().nth(1) {
        Some(path) if path != "-" => {
            std::fs::read_to_string(&path).wrap_err_with(|| format!("Failed to read {}", path))?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("Failed to read record from stdin")?;
            buf
        }
    };

    let record: Value = serde_json::from_str(&raw).wrap_err("Record is not valid JSON")?;

    let config = EngineConfig::from_env()?;
    let orchestrator = PredictionOrchestrator::new(
        HttpPredictor::new(config.predict_endpoint()),
        config.interactive_timeout,
    );

    let outcome = orchestrator.assess(&record).await;
    if let Some(cause) = outcome.cause() {
        info!("Degraded: {}", cause);
    }

    let assessment = outcome.into_result()?;
    println!("{}", serde_json::to_string_pretty(&format_now(&assessment))?);

    Ok(())
}
