//! Response Formatter
//!
//! Maps engine units (0-1 score) to presentation units: a 0-100 integer
//! score, the level name, the method tag and an ISO-8601 timestamp.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::types::RiskAssessment;

/// Presentation record returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAssessment {
    /// 0-100
    pub score: u8,
    /// "Low Risk" | "Medium Risk" | "High Risk"
    pub category: String,
    /// Same value as `category`
    pub risk_level: String,
    /// "primary" | "fallback" | "emergency_fallback"
    pub method: String,
    pub factors: Vec<String>,
    pub last_updated: String,
    pub message: String,
}

/// Format with an explicit timestamp
pub fn format_assessment(assessment: &RiskAssessment, now: DateTime<Utc>) -> FormattedAssessment {
    let score = (assessment.score * 100.0).round().clamp(0.0, 100.0) as u8;
    let level = assessment.level.as_str().to_string();

    FormattedAssessment {
        score,
        category: level.clone(),
        risk_level: level,
        method: assessment.method.as_str().to_string(),
        factors: assessment.factors.clone(),
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        message: assessment.method.message().to_string(),
    }
}

/// Format stamped with the current time
pub fn format_now(assessment: &RiskAssessment) -> FormattedAssessment {
    format_assessment(assessment, Utc::now())
}
