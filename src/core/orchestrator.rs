//! Prediction Orchestrator
//!
//! Tiered resilience protocol. Every request yields exactly one outcome:
//!
//! ```text
//!  Tier 1  primary              external predictor, bounded by one timeout
//!     │ timeout / connect / non-2xx          │ malformed payload
//!     ▼                                      │
//!  Tier 2  fallback             local scorer on the normalized record
//!     │ scorer failure                       │
//!     ▼                                      ▼
//!  Tier 3  emergency_fallback   local scorer re-run on the original record
//!     │ scorer failure
//!     ▼
//!  Terminal                     error with the underlying cause, no score
//! ```
//!
//! No tier is retried. Dropping the future returned by `assess` drops the
//! in-flight predictor call with it.

use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::core::normalizer::normalize;
use crate::core::risk_score::{score_metrics, RiskScore};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{AssessmentMethod, BusinessMetrics, RiskAssessment};
use crate::providers::ml_service::RiskPredictor;

/// Local scoring function used by tiers 2 and 3
pub type LocalScorer = fn(&BusinessMetrics) -> RiskScore;

/// Result of one pass through the protocol
#[derive(Debug)]
pub enum PredictionOutcome {
    /// External predictor answered with a usable payload
    Primary(RiskAssessment),
    /// Predictor unavailable; local scorer answered
    Fallback {
        assessment: RiskAssessment,
        cause: AppError,
    },
    /// Predictor payload unusable or tier 2 failed; local scorer re-run
    EmergencyFallback {
        assessment: RiskAssessment,
        cause: AppError,
    },
    /// Every tier failed
    Terminal(AppError),
}

impl PredictionOutcome {
    pub fn method(&self) -> Option<AssessmentMethod> {
        self.assessment().map(|a| a.method)
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            Self::Primary(assessment)
            | Self::Fallback { assessment, .. }
            | Self::EmergencyFallback { assessment, .. } => Some(assessment),
            Self::Terminal(_) => None,
        }
    }

    /// The failure that caused degradation, if any
    pub fn cause(&self) -> Option<&AppError> {
        match self {
            Self::Primary(_) => None,
            Self::Fallback { cause, .. } | Self::EmergencyFallback { cause, .. } => Some(cause),
            Self::Terminal(err) => Some(err),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Primary(_))
    }

    /// Collapse to a plain result. Only `Terminal` is an error.
    pub fn into_result(self) -> AppResult<RiskAssessment> {
        match self {
            Self::Primary(assessment)
            | Self::Fallback { assessment, .. }
            | Self::EmergencyFallback { assessment, .. } => Ok(assessment),
            Self::Terminal(err) => Err(err),
        }
    }
}

/// Coordinates the external call and the local fallbacks
pub struct PredictionOrchestrator<P> {
    predictor: P,
    timeout: Duration,
    local_scorer: LocalScorer,
}

impl<P: RiskPredictor> PredictionOrchestrator<P> {
    pub fn new(predictor: P, timeout: Duration) -> Self {
        Self {
            predictor,
            timeout,
            local_scorer: score_metrics,
        }
    }

    /// Replace the local scorer used by tiers 2 and 3
    pub fn with_local_scorer(mut self, scorer: LocalScorer) -> Self {
        self.local_scorer = scorer;
        self
    }

    /// Run the full protocol for one raw record
    pub async fn assess(&self, record: &Value) -> PredictionOutcome {
        let cause = match self.call_predictor(record).await {
            Ok(assessment) => {
                info!("✅ Primary prediction: {}", assessment.summary());
                return PredictionOutcome::Primary(assessment);
            }
            Err(cause) if cause.code.is_malformed_external() => {
                warn!(code = cause.code_str(), "⚠️ Unusable ML service payload: {}", cause.message);
                return self.emergency_fallback(record, cause);
            }
            Err(cause) => cause,
        };

        warn!(
            code = cause.code_str(),
            "⚠️ ML service unavailable, using fallback calculation: {}", cause.message
        );

        match self.run_local(record, AssessmentMethod::Fallback) {
            Ok(assessment) => {
                info!("🔄 Fallback prediction: {}", assessment.summary());
                PredictionOutcome::Fallback { assessment, cause }
            }
            Err(local_err) => {
                warn!(
                    code = local_err.code_str(),
                    predictor_error = %cause,
                    "⚠️ Fallback calculation failed: {}", local_err.message
                );
                self.emergency_fallback(record, local_err.caused_by(cause))
            }
        }
    }

    /// Tier 1 only: one bounded call, payload validated, no fallback
    pub async fn call_predictor(&self, record: &Value) -> AppResult<RiskAssessment> {
        let prediction = match tokio::time::timeout(self.timeout, self.predictor.predict(record)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::external_timeout(format!(
                    "ML service did not answer within {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        prediction.into_assessment()
    }

    fn emergency_fallback(&self, record: &Value, cause: AppError) -> PredictionOutcome {
        match self.run_local(record, AssessmentMethod::EmergencyFallback) {
            Ok(assessment) => {
                info!("🚑 Emergency fallback prediction: {}", assessment.summary());
                PredictionOutcome::EmergencyFallback { assessment, cause }
            }
            Err(local_err) => {
                error!(
                    code = local_err.code_str(),
                    earlier_error = %cause,
                    "❌ Even emergency fallback failed: {}", local_err.message
                );
                // Keep every earlier tier's failure in the chain
                PredictionOutcome::Terminal(AppError::with_source(
                    ErrorCode::TerminalFailure,
                    "Unable to calculate risk prediction",
                    local_err.caused_by(cause),
                ))
            }
        }
    }

    /// Normalize and score locally; a panic or an out-of-range score is a failure
    fn run_local(&self, record: &Value, method: AssessmentMethod) -> AppResult<RiskAssessment> {
        let scorer = self.local_scorer;

        let assessment = panic::catch_unwind(AssertUnwindSafe(|| {
            let metrics = normalize(record);
            scorer(&metrics).into_assessment(method)
        }))
        .map_err(|payload| {
            AppError::scorer_failed(format!("Local scorer panicked: {}", panic_message(payload.as_ref())))
        })?;

        if !assessment.is_valid() {
            return Err(AppError::scorer_failed(format!(
                "Local scorer produced invalid score {}",
                assessment.score
            )));
        }

        Ok(assessment)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::RiskLevel;
    use crate::providers::ml_service::ExternalPrediction;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Predictor answering from a fixed function
    struct StubPredictor(fn() -> AppResult<ExternalPrediction>);

    impl RiskPredictor for StubPredictor {
        async fn predict(&self, _record: &Value) -> AppResult<ExternalPrediction> {
            (self.0)()
        }
    }

    /// Predictor that answers only after a delay
    struct SlowPredictor(Duration);

    impl RiskPredictor for SlowPredictor {
        async fn predict(&self, _record: &Value) -> AppResult<ExternalPrediction> {
            tokio::time::sleep(self.0).await;
            valid_prediction()
        }
    }

    fn valid_prediction() -> AppResult<ExternalPrediction> {
        Ok(ExternalPrediction {
            risk_score: Some(0.42),
            risk_level: Some("Medium Risk".to_string()),
            factors: Some(vec!["x".to_string()]),
        })
    }

    fn refused() -> AppResult<ExternalPrediction> {
        Err(AppError::external_connection_failed("Connection refused"))
    }

    fn missing_score() -> AppResult<ExternalPrediction> {
        Ok(ExternalPrediction {
            risk_score: None,
            risk_level: Some("High Risk".to_string()),
            factors: None,
        })
    }

    fn panicking_scorer(_: &BusinessMetrics) -> RiskScore {
        panic!("scorer exploded")
    }

    fn nan_scorer(_: &BusinessMetrics) -> RiskScore {
        RiskScore {
            total: f64::NAN,
            components: Default::default(),
            factors: vec![],
        }
    }

    static FLAKY_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn flaky_scorer(metrics: &BusinessMetrics) -> RiskScore {
        if FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first pass fails");
        }
        score_metrics(metrics)
    }

    fn record() -> Value {
        json!({"revenue": 100000, "expenses": 150000, "employeeCount": 2})
    }

    fn orchestrator<P: RiskPredictor>(predictor: P) -> PredictionOrchestrator<P> {
        PredictionOrchestrator::new(predictor, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_primary_passes_through() {
        let outcome = orchestrator(StubPredictor(valid_prediction)).assess(&record()).await;

        assert_eq!(outcome.method(), Some(AssessmentMethod::Primary));
        assert!(!outcome.is_degraded());
        let assessment = outcome.into_result().unwrap();
        assert_eq!(assessment.score, 0.42);
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert_eq!(assessment.factors, vec!["x"]);
    }

    #[tokio::test]
    async fn test_unavailable_predictor_uses_fallback() {
        let outcome = orchestrator(StubPredictor(refused)).assess(&record()).await;

        assert_eq!(outcome.method(), Some(AssessmentMethod::Fallback));
        assert_eq!(
            outcome.cause().map(|c| c.code),
            Some(ErrorCode::ExternalConnectionFailed)
        );

        let expected = score_metrics(&normalize(&record()));
        let assessment = outcome.into_result().unwrap();
        assert_eq!(assessment.score, expected.normalized());
        assert_eq!(assessment.factors, expected.factors);
    }

    #[tokio::test]
    async fn test_timeout_abandons_call() {
        let start = Instant::now();
        let outcome = PredictionOrchestrator::new(
            SlowPredictor(Duration::from_secs(30)),
            Duration::from_millis(50),
        )
        .assess(&record())
        .await;

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.method(), Some(AssessmentMethod::Fallback));
        assert_eq!(outcome.cause().map(|c| c.code), Some(ErrorCode::ExternalTimeout));
    }

    #[tokio::test]
    async fn test_malformed_payload_uses_emergency_fallback() {
        let outcome = orchestrator(StubPredictor(missing_score)).assess(&record()).await;

        assert_eq!(outcome.method(), Some(AssessmentMethod::EmergencyFallback));
        assert_eq!(
            outcome.cause().map(|c| c.code),
            Some(ErrorCode::ExternalMalformedResponse)
        );
        let expected = score_metrics(&normalize(&record()));
        assert_eq!(outcome.assessment().unwrap().score, expected.normalized());
    }

    #[tokio::test]
    async fn test_failed_fallback_moves_to_emergency() {
        let outcome = orchestrator(StubPredictor(refused))
            .with_local_scorer(flaky_scorer)
            .assess(&record())
            .await;

        assert_eq!(outcome.method(), Some(AssessmentMethod::EmergencyFallback));
        assert_eq!(outcome.cause().map(|c| c.code), Some(ErrorCode::ScorerFailed));
    }

    #[tokio::test]
    async fn test_terminal_when_every_tier_fails() {
        let outcome = orchestrator(StubPredictor(refused))
            .with_local_scorer(panicking_scorer)
            .assess(&record())
            .await;

        assert!(outcome.assessment().is_none());
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::TerminalFailure);
        let details = err.details();
        assert!(details.contains("scorer exploded"));
        // Tier 1 failure survives to the end of the chain
        assert!(details.ends_with("[EXT_CONNECTION_FAILED] Connection refused"));
    }

    #[tokio::test]
    async fn test_invalid_local_score_is_a_failure() {
        let outcome = orchestrator(StubPredictor(missing_score))
            .with_local_scorer(nan_scorer)
            .assess(&record())
            .await;

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::TerminalFailure);
        assert!(err.details().contains("invalid score"));
        assert!(err.details().contains("EXT_MALFORMED_RESPONSE"));
    }

    #[tokio::test]
    async fn test_call_predictor_does_not_fall_back() {
        let err = orchestrator(StubPredictor(refused))
            .call_predictor(&record())
            .await
            .unwrap_err();
        assert!(err.code.is_external_unavailable());
    }
}
