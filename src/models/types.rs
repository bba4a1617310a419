//! Type definitions for the risk engine
//! Business metrics in, risk assessment out

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::constants::{HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD, NEUTRAL_SCALE_SCORE};

/// Normalized business metrics. Every field always holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    pub revenue: f64,
    pub expenses: f64,
    pub cash_flow: f64,
    pub debt: f64,
    pub assets: f64,
    pub employee_count: u32,
    pub years_in_business: u32,
    /// Market growth in percent
    pub market_growth: f64,
    /// Customer retention in percent
    pub customer_retention: f64,
    /// 1-10 scale
    pub competition_level: u8,
    /// 1-10 scale
    pub digital_presence: u8,
    /// 1-10 scale
    pub innovation_score: u8,
}

impl Default for BusinessMetrics {
    fn default() -> Self {
        Self {
            revenue: 0.0,
            expenses: 0.0,
            cash_flow: 0.0,
            debt: 0.0,
            assets: 0.0,
            employee_count: 0,
            years_in_business: 0,
            market_growth: 0.0,
            customer_retention: 0.0,
            competition_level: NEUTRAL_SCALE_SCORE,
            digital_presence: NEUTRAL_SCALE_SCORE,
            innovation_score: NEUTRAL_SCALE_SCORE,
        }
    }
}

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a normalized (0-1) score. Lower bounds are inclusive on the upper tier.
    pub fn from_score(score: f64) -> Self {
        if score < MEDIUM_RISK_THRESHOLD {
            RiskLevel::Low
        } else if score < HIGH_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Presentation name, e.g. "Medium Risk"
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Accepts "Low Risk" / "low" / "HIGH" and so on
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let name = lowered.strip_suffix(" risk").unwrap_or(&lowered).trim();
        match name {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("unknown risk level: {:?}", s)),
        }
    }
}

/// Which tier of the protocol produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMethod {
    Primary,
    Fallback,
    EmergencyFallback,
}

impl AssessmentMethod {
    pub const ALL: [AssessmentMethod; 3] = [
        AssessmentMethod::Primary,
        AssessmentMethod::Fallback,
        AssessmentMethod::EmergencyFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentMethod::Primary => "primary",
            AssessmentMethod::Fallback => "fallback",
            AssessmentMethod::EmergencyFallback => "emergency_fallback",
        }
    }

    /// Human-readable provenance note for API responses
    pub fn message(&self) -> &'static str {
        match self {
            AssessmentMethod::Primary => "Risk prediction completed successfully",
            AssessmentMethod::Fallback => {
                "Risk prediction completed using fallback calculation (ML service unavailable)"
            }
            AssessmentMethod::EmergencyFallback => {
                "Risk prediction completed using emergency fallback calculation"
            }
        }
    }
}

impl fmt::Display for AssessmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine output for a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Normalized score in [0, 1]
    pub score: f64,
    pub level: RiskLevel,
    /// Triggered risk conditions in evaluation order
    pub factors: Vec<String>,
    pub method: AssessmentMethod,
}

impl RiskAssessment {
    /// Check the invariants a finished assessment must hold
    pub fn is_valid(&self) -> bool {
        self.score.is_finite() && (0.0..=1.0).contains(&self.score)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} | Score: {:.2} | Method: {} | Factors: {}",
            self.level.emoji(),
            self.level,
            self.score,
            self.method,
            self.factors.len()
        )
    }
}
