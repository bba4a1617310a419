//! API Request/Response Types

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::core::formatter::FormattedAssessment;
use crate::models::errors::AppError;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// HTTP status for an application error, taken from its code
pub fn status_for(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Error envelope with the status matching the error code
pub fn error_response(err: &AppError, latency_ms: f64) -> (StatusCode, Json<ApiResponse<()>>) {
    (status_for(err), Json(ApiResponse::error(err.into(), latency_ms)))
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: err.source.as_ref().map(|_| err.details()),
        }
    }
}

// ============================================
// Single Prediction
// ============================================

/// Body returned when every tier failed
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictErrorBody {
    pub error: String,
    pub message: String,
    pub details: String,
}

// ============================================
// Model-only Prediction
// ============================================

/// Body returned when required fields are missing
#[derive(Debug, Serialize, Deserialize)]
pub struct MissingFieldsBody {
    pub error: String,
    pub missing: Vec<String>,
    pub message: String,
}

/// Body returned when the predictor could not answer
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUnavailableBody {
    pub error: String,
    pub message: String,
    pub details: String,
    pub ml_service_error: String,
}

// ============================================
// Batch Assessment
// ============================================

#[derive(Debug, Deserialize)]
pub struct BatchAssessmentRequest {
    pub records: Vec<Value>,
    /// Max concurrent assessments (default from config, max: 50)
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl BatchAssessmentRequest {
    pub fn concurrency_or_default(&self, default: usize) -> usize {
        self.concurrency.unwrap_or(default)
    }
}

#[derive(Debug, Serialize)]
pub struct BatchAssessmentData {
    pub total_requested: usize,
    pub total_processed: usize,
    pub total_failed: usize,
    /// Counts per risk level ("Low Risk", ...)
    pub by_level: HashMap<String, usize>,
    /// Counts per method tag ("primary", ...)
    pub by_method: HashMap<String, usize>,
    pub results: Vec<BatchRowResult>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchRowResult {
    pub index: usize,
    pub status: String, // "success" | "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<FormattedAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: f64,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub telemetry: TelemetryStats,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ml_service_endpoint: String,
}
