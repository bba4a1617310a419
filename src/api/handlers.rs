//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::types::*;
use crate::core::formatter::{format_now, FormattedAssessment};
use crate::core::orchestrator::{LocalScorer, PredictionOrchestrator};
use crate::models::config::EngineConfig;
use crate::models::errors::AppError;
use crate::providers::ml_service::{HttpPredictor, RiskPredictor};
use crate::utils::constants::{
    APP_VERSION, MAX_BATCH_CONCURRENCY, MAX_BATCH_RECORDS, STRICT_REQUIRED_FIELDS,
};
use crate::utils::telemetry::TelemetryCollector;

/// Message on a successful model-only prediction
const MODEL_ONLY_MESSAGE: &str = "Risk prediction completed using your trained ML model!";

/// Shared application state
pub struct AppState<P = HttpPredictor> {
    /// Full protocol, interactive timeout
    pub interactive: PredictionOrchestrator<P>,
    /// Full protocol, deferred/batch timeout (also used by the model-only path)
    pub batch: PredictionOrchestrator<P>,
    pub telemetry: Arc<TelemetryCollector>,
    pub batch_concurrency: usize,
    pub ml_service_endpoint: String,
    pub start_time: Instant,
}

impl AppState<HttpPredictor> {
    /// Build state talking to the configured ML service
    pub fn from_config(config: &EngineConfig, telemetry: Arc<TelemetryCollector>) -> Self {
        let predictor = HttpPredictor::new(config.predict_endpoint());
        Self::new(predictor, config, telemetry)
    }
}

impl<P: RiskPredictor + Clone> AppState<P> {
    pub fn new(predictor: P, config: &EngineConfig, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            interactive: PredictionOrchestrator::new(predictor.clone(), config.interactive_timeout),
            batch: PredictionOrchestrator::new(predictor, config.batch_timeout),
            telemetry,
            batch_concurrency: config.batch_concurrency,
            ml_service_endpoint: config.predict_endpoint(),
            start_time: Instant::now(),
        }
    }
}

impl<P: RiskPredictor> AppState<P> {
    /// Replace the local scorer on both orchestrators
    pub fn with_local_scorer(self, scorer: LocalScorer) -> Self {
        Self {
            interactive: self.interactive.with_local_scorer(scorer),
            batch: self.batch.with_local_scorer(scorer),
            ..self
        }
    }
}

impl<P> AppState<P> {
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check<P: RiskPredictor + 'static>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        ml_service_endpoint: state.ml_service_endpoint.clone(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Risk Prediction (tiered)
// ============================================

pub async fn predict_risk<P: RiskPredictor + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Json(record): Json<Value>,
) -> Result<Json<FormattedAssessment>, (StatusCode, Json<PredictErrorBody>)> {
    let start = Instant::now();

    let outcome = state.interactive.assess(&record).await;
    let latency = start.elapsed().as_millis() as u64;

    match outcome.into_result() {
        Ok(assessment) => {
            state
                .telemetry
                .record_assessment(assessment.method, assessment.level, latency);
            Ok(Json(format_now(&assessment)))
        }
        Err(err) => {
            state.telemetry.record_terminal(latency);
            error!(code = err.code_str(), "❌ Risk prediction failed: {}", err.details());

            Err((
                status_for(&err),
                Json(PredictErrorBody {
                    error: "Internal server error".to_string(),
                    message: err.message.clone(),
                    details: err.details(),
                }),
            ))
        }
    }
}

// ============================================
// Model-only Prediction (no fallback)
// ============================================

/// Required fields that are absent, null, empty or `false`. An explicit 0 counts as present.
pub fn missing_required_fields(record: &Value) -> Vec<String> {
    STRICT_REQUIRED_FIELDS
        .iter()
        .filter(|field| match record.get(**field) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect()
}

pub async fn predict_model_only<P: RiskPredictor + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Json(record): Json<Value>,
) -> Result<Json<FormattedAssessment>, (StatusCode, Json<Value>)> {
    let start = Instant::now();

    let missing = missing_required_fields(&record);
    if !missing.is_empty() {
        warn!(?missing, "❌ Missing required fields");
        let err = AppError::bad_request("Missing required fields");
        let body = MissingFieldsBody {
            error: err.message.clone(),
            missing,
            message: "Please fill in all required fields".to_string(),
        };
        return Err((status_for(&err), Json(to_value(&body))));
    }

    match state.batch.call_predictor(&record).await {
        Ok(assessment) => {
            state.telemetry.record_assessment(
                assessment.method,
                assessment.level,
                start.elapsed().as_millis() as u64,
            );

            let mut formatted = format_now(&assessment);
            formatted.message = MODEL_ONLY_MESSAGE.to_string();
            Ok(Json(formatted))
        }
        Err(err) => {
            warn!(code = err.code_str(), "⚠️ ML service unavailable: {}", err.message);
            let body = ModelUnavailableBody {
                error: "ML service unavailable".to_string(),
                message: "The ML prediction service is not running. Start it and retry.".to_string(),
                details: "Model-only predictions require the external ML service.".to_string(),
                ml_service_error: format!("{}: {}", err.code_str(), err.details()),
            };
            Err((status_for(&err), Json(to_value(&body))))
        }
    }
}

// ============================================
// Batch Assessment
// ============================================

pub async fn batch_assess<P: RiskPredictor + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<BatchAssessmentRequest>,
) -> Result<Json<ApiResponse<BatchAssessmentData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if req.records.is_empty() {
        return Err(error_response(
            &AppError::bad_request("No records provided"),
            start.elapsed().as_secs_f64() * 1000.0,
        ));
    }

    if req.records.len() > MAX_BATCH_RECORDS {
        return Err(error_response(
            &AppError::bad_request(format!(
                "Maximum {} records per batch request",
                MAX_BATCH_RECORDS
            )),
            start.elapsed().as_secs_f64() * 1000.0,
        ));
    }

    let concurrency = req
        .concurrency_or_default(state.batch_concurrency)
        .clamp(1, MAX_BATCH_CONCURRENCY);
    let total_requested = req.records.len();

    info!(
        "📦 Batch assessment: {} records, concurrency {}",
        total_requested, concurrency
    );

    // Process records concurrently
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let handles: Vec<_> = req
        .records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let sem = semaphore.clone();
            let state = state.clone();

            tokio::spawn(async move {
                let item_start = Instant::now();
                let _permit = match sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return error_row(index, "Batch cancelled", item_start),
                };

                let outcome = state.batch.assess(&record).await;
                let latency = item_start.elapsed().as_millis() as u64;

                match outcome.into_result() {
                    Ok(assessment) => {
                        state
                            .telemetry
                            .record_assessment(assessment.method, assessment.level, latency);
                        BatchRowResult {
                            index,
                            status: "success".to_string(),
                            assessment: Some(format_now(&assessment)),
                            error: None,
                            latency_ms: item_start.elapsed().as_secs_f64() * 1000.0,
                        }
                    }
                    Err(err) => {
                        state.telemetry.record_terminal(latency);
                        error_row(index, &err.to_string(), item_start)
                    }
                }
            })
        })
        .collect();

    // Collect results in input order
    let results: Vec<BatchRowResult> = join_all(handles)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, joined)| match joined {
            Ok(row) => row,
            Err(e) => error_row(index, &format!("Assessment task failed: {}", e), start),
        })
        .collect();

    // Calculate summary
    let mut by_level: HashMap<String, usize> = HashMap::new();
    let mut by_method: HashMap<String, usize> = HashMap::new();
    for assessment in results.iter().filter_map(|r| r.assessment.as_ref()) {
        *by_level.entry(assessment.category.clone()).or_insert(0) += 1;
        *by_method.entry(assessment.method.clone()).or_insert(0) += 1;
    }
    let total_failed = results.iter().filter(|r| r.assessment.is_none()).count();

    let data = BatchAssessmentData {
        total_requested,
        total_processed: results.len() - total_failed,
        total_failed,
        by_level,
        by_method,
        results,
        processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats<P: RiskPredictor + 'static>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let stats = state.telemetry.get_stats();

    info!("📊 Stats: {}", stats.summary());

    let data = StatsData {
        telemetry: stats,
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Helper Functions
// ============================================

fn error_row(index: usize, message: &str, started: Instant) -> BatchRowResult {
    BatchRowResult {
        index,
        status: "error".to_string(),
        assessment: None,
        error: Some(message.to_string()),
        latency_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}

fn to_value<T: serde::Serialize>(body: &T) -> Value {
    serde_json::to_value(body).unwrap_or(Value::Null)
}
