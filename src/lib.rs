//! Beacon Risk Library
//!
//! Risk assessment engine for micro, small and medium enterprises:
//! - Feature normalization of loosely typed business records
//! - Deterministic weighted scoring (financial, maturity, market, innovation)
//! - Tiered prediction protocol: external ML service, local fallback,
//!   emergency fallback
//! - REST API with batch assessment and telemetry

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::formatter::{format_assessment, format_now, FormattedAssessment};
pub use crate::core::normalizer::normalize;
pub use crate::core::orchestrator::{LocalScorer, PredictionOrchestrator, PredictionOutcome};
pub use crate::core::risk_score::{score_metrics, RiskComponents, RiskScore, RiskScoreBuilder};
pub use models::config::{EngineConfig, ServerConfig};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{AssessmentMethod, BusinessMetrics, RiskAssessment, RiskLevel};
pub use providers::ml_service::{ExternalPrediction, HttpPredictor, RiskPredictor};
pub use utils::telemetry::{TelemetryCollector, TelemetryStats};
