//! ML Prediction Service Client
//!
//! The external predictor is a plain HTTP service:
//! `POST <base>/predict` with the raw business record as JSON, answering
//! `{ "risk_score": 0.42, "risk_level": "Medium Risk", "factors": [...] }`.
//!
//! Timeouts are not applied here. The orchestrator bounds the whole call so
//! that a slow predictor is abandoned, not awaited.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{AssessmentMethod, RiskAssessment, RiskLevel};
use crate::utils::constants::USER_AGENT;

/// Anything that can produce an external prediction for a raw record
pub trait RiskPredictor: Send + Sync {
    fn predict(
        &self,
        record: &Value,
    ) -> impl Future<Output = AppResult<ExternalPrediction>> + Send;
}

/// Predictor response body as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalPrediction {
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub factors: Option<Vec<String>>,
}

impl ExternalPrediction {
    /// Validate the payload and tag it as a primary assessment.
    /// Factors are passed through untouched.
    pub fn into_assessment(self) -> AppResult<RiskAssessment> {
        let score = self
            .risk_score
            .ok_or_else(|| AppError::malformed_response("Predictor response is missing risk_score"))?;

        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(AppError::malformed_response(format!(
                "risk_score {} is outside [0, 1]",
                score
            )));
        }

        let level = self
            .risk_level
            .as_deref()
            .ok_or_else(|| AppError::malformed_response("Predictor response is missing risk_level"))?
            .parse::<RiskLevel>()
            .map_err(AppError::malformed_response)?;

        Ok(RiskAssessment {
            score,
            level,
            factors: self.factors.unwrap_or_default(),
            method: AssessmentMethod::Primary,
        })
    }
}

/// reqwest-backed predictor
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RiskPredictor for HttpPredictor {
    async fn predict(&self, record: &Value) -> AppResult<ExternalPrediction> {
        debug!("📡 Sending record to ML service: {}", self.endpoint);

        let response = self.client.post(&self.endpoint).json(record).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let prediction: ExternalPrediction = serde_json::from_slice(&body)?;

        info!(
            "✅ ML service response: score={:?}, level={:?}",
            prediction.risk_score, prediction.risk_level
        );

        Ok(prediction)
    }
}
