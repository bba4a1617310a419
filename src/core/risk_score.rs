//! Risk Scoring Module
//! Deterministic weighted scoring over normalized business metrics
//!
//! Four sub-scores, each built from a ladder of threshold checks and capped
//! at its sub-maximum, then weighted onto a 0-100 scale:
//! - Financial Health (40%)
//! - Business Maturity (20%)
//! - Market Position (25%)
//! - Innovation/Digital (15%)
//!
//! Factors are appended in evaluation order and never reordered.

use serde::{Deserialize, Serialize};

use crate::models::types::{AssessmentMethod, BusinessMetrics, RiskAssessment, RiskLevel};
use crate::utils::constants::*;

/// Scored result on the 0-100 scale, before a method tag is attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Overall score (0-100)
    pub total: f64,
    /// Capped sub-scores, before weighting
    pub components: RiskComponents,
    /// Triggered risk conditions
    pub factors: Vec<String>,
}

/// Capped raw sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskComponents {
    /// 0-40
    pub financial: f64,
    /// 0-25
    pub maturity: f64,
    /// 0-25
    pub market: f64,
    /// 0-15
    pub innovation: f64,
}

impl RiskComponents {
    /// Each capped sub-score scaled to its share of the 100-point range
    pub fn weighted_total(&self) -> f64 {
        let weighted = [
            (self.financial, FINANCIAL_SUB_MAX, FINANCIAL_WEIGHT),
            (self.maturity, MATURITY_SUB_MAX, MATURITY_WEIGHT),
            (self.market, MARKET_SUB_MAX, MARKET_WEIGHT),
            (self.innovation, INNOVATION_SUB_MAX, INNOVATION_WEIGHT),
        ];

        weighted
            .iter()
            .map(|(score, sub_max, weight)| score / sub_max * weight * 100.0)
            .sum()
    }
}

impl RiskScore {
    pub fn calculate(components: RiskComponents, factors: Vec<String>) -> Self {
        let total = components.weighted_total().clamp(0.0, 100.0);
        Self {
            total,
            components,
            factors,
        }
    }

    /// Score on the 0-1 scale
    pub fn normalized(&self) -> f64 {
        self.total / 100.0
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.normalized())
    }

    pub fn into_assessment(self, method: AssessmentMethod) -> RiskAssessment {
        RiskAssessment {
            score: self.normalized(),
            level: self.level(),
            factors: self.factors,
            method,
        }
    }
}

/// Builder that evaluates one sub-score ladder at a time
pub struct RiskScoreBuilder {
    factors: Vec<String>,
    components: RiskComponents,
}

impl RiskScoreBuilder {
    pub fn new() -> Self {
        Self {
            factors: Vec::new(),
            components: RiskComponents::default(),
        }
    }

    fn flag(&mut self, factor: &str) {
        self.factors.push(factor.to_string());
    }

    /// Profit margin, leverage and cash-flow coverage
    pub fn with_financial_health(mut self, m: &BusinessMetrics) -> Self {
        let profit_margin = if m.revenue > 0.0 {
            (m.revenue - m.expenses) / m.revenue * 100.0
        } else {
            -100.0
        };
        let debt_to_asset = if m.assets > 0.0 { m.debt / m.assets } else { 1.0 };
        let cash_flow_ratio = if m.revenue > 0.0 {
            m.cash_flow / (m.revenue / 12.0)
        } else {
            -1.0
        };

        let mut risk = 0.0;

        if profit_margin < 0.0 {
            risk += 40.0;
            self.flag(FACTOR_NEGATIVE_PROFIT);
        } else if profit_margin < 10.0 {
            risk += 25.0;
            self.flag(FACTOR_LOW_PROFIT);
        } else if profit_margin < 20.0 {
            risk += 10.0;
        }

        if debt_to_asset > 0.7 {
            risk += 30.0;
            self.flag(FACTOR_HIGH_DEBT);
        } else if debt_to_asset > 0.5 {
            risk += 15.0;
        }

        if cash_flow_ratio < 0.0 {
            risk += 30.0;
            self.flag(FACTOR_NEGATIVE_CASH_FLOW);
        } else if cash_flow_ratio < 0.1 {
            risk += 15.0;
            self.flag(FACTOR_POOR_CASH_FLOW);
        }

        self.components.financial = f64::min(risk, FINANCIAL_SUB_MAX);
        self
    }

    /// Years trading and team size
    pub fn with_business_maturity(mut self, m: &BusinessMetrics) -> Self {
        let mut risk = 0.0;

        if m.years_in_business < 1 {
            risk += 25.0;
            self.flag(FACTOR_VERY_NEW);
        } else if m.years_in_business < 3 {
            risk += 15.0;
            self.flag(FACTOR_YOUNG);
        } else if m.years_in_business < 5 {
            risk += 8.0;
        }

        if m.employee_count < 3 {
            risk += 10.0;
            self.flag(FACTOR_SMALL_TEAM);
        } else if m.employee_count < 10 {
            risk += 5.0;
        }

        self.components.maturity = f64::min(risk, MATURITY_SUB_MAX);
        self
    }

    /// Market growth, competition and retention
    pub fn with_market_position(mut self, m: &BusinessMetrics) -> Self {
        let mut risk = 0.0;

        if m.market_growth < 0.0 {
            risk += 20.0;
            self.flag(FACTOR_DECLINING_MARKET);
        } else if m.market_growth < 3.0 {
            risk += 10.0;
            self.flag(FACTOR_SLOW_GROWTH);
        }

        if m.competition_level > 7 {
            risk += 15.0;
            self.flag(FACTOR_HIGH_COMPETITION);
        } else if m.competition_level > 5 {
            risk += 8.0;
        }

        if m.customer_retention < 50.0 {
            risk += 15.0;
            self.flag(FACTOR_POOR_RETENTION);
        } else if m.customer_retention < 75.0 {
            risk += 8.0;
        }

        self.components.market = f64::min(risk, MARKET_SUB_MAX);
        self
    }

    pub fn with_innovation(mut self, m: &BusinessMetrics) -> Self {
        let mut risk = 0.0;

        if m.digital_presence < 3 {
            risk += 10.0;
            self.flag(FACTOR_LOW_DIGITAL);
        } else if m.digital_presence < 6 {
            risk += 5.0;
        }

        if m.innovation_score < 3 {
            risk += 10.0;
            self.flag(FACTOR_LOW_INNOVATION);
        } else if m.innovation_score < 6 {
            risk += 5.0;
        }

        self.components.innovation = f64::min(risk, INNOVATION_SUB_MAX);
        self
    }

    pub fn build(self) -> RiskScore {
        RiskScore::calculate(self.components, self.factors)
    }
}

impl Default for RiskScoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Score a metric set. Pure: same input, same output.
pub fn score_metrics(metrics: &BusinessMetrics) -> RiskScore {
    RiskScoreBuilder::new()
        .with_financial_health(metrics)
        .with_business_maturity(metrics)
        .with_market_position(metrics)
        .with_innovation(metrics)
        .build()
}
