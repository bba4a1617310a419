//! Telemetry Module
//!
//! In-process counters describing how assessments were produced:
//! - how many requests were served per method tag (degradation rate)
//! - how many ended in a terminal failure
//! - average end-to-end latency
//!
//! No record contents are retained.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::types::{AssessmentMethod, RiskLevel};

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    /// Requests that produced an assessment
    pub total_assessments: u64,
    /// Assessments per method tag
    pub assessments_by_method: HashMap<String, u64>,
    /// Assessments per risk level
    pub assessments_by_level: HashMap<String, u64>,
    /// Requests where every tier failed
    pub terminal_failures: u64,
    /// Share of assessments not served by the external predictor (0-1)
    pub degraded_ratio: f64,
    /// Average latency over all requests, terminal ones included (ms)
    pub avg_latency_ms: f64,
    /// Period start timestamp
    pub period_start: u64,
    /// Period end timestamp
    pub period_end: u64,
}

impl TelemetryStats {
    pub fn count_for(&self, method: AssessmentMethod) -> u64 {
        self.assessments_by_method
            .get(method.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// One-line report for shutdown logs
    pub fn summary(&self) -> String {
        format!(
            "assessments={} primary={} fallback={} emergency_fallback={} terminal={} degraded={:.1}% avg_latency={:.2}ms",
            self.total_assessments,
            self.count_for(AssessmentMethod::Primary),
            self.count_for(AssessmentMethod::Fallback),
            self.count_for(AssessmentMethod::EmergencyFallback),
            self.terminal_failures,
            self.degraded_ratio * 100.0,
            self.avg_latency_ms,
        )
    }
}

/// Main telemetry collector
pub struct TelemetryCollector {
    // Atomic counters for fast updates
    primary: AtomicU64,
    fallback: AtomicU64,
    emergency_fallback: AtomicU64,
    low: AtomicU64,
    medium: AtomicU64,
    high: AtomicU64,
    terminal_failures: AtomicU64,
    total_latency_ms: AtomicU64,
    /// Session start time
    session_start: u64,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            primary: AtomicU64::new(0),
            fallback: AtomicU64::new(0),
            emergency_fallback: AtomicU64::new(0),
            low: AtomicU64::new(0),
            medium: AtomicU64::new(0),
            high: AtomicU64::new(0),
            terminal_failures: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            session_start: current_timestamp(),
        }
    }

    /// Record a request that produced an assessment
    pub fn record_assessment(&self, method: AssessmentMethod, level: RiskLevel, latency_ms: u64) {
        self.method_counter(method).fetch_add(1, Ordering::Relaxed);
        self.level_counter(level).fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Record a request where every tier failed
    pub fn record_terminal(&self, latency_ms: u64) {
        self.terminal_failures.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        let by_method: Vec<(AssessmentMethod, u64)> = AssessmentMethod::ALL
            .iter()
            .map(|m| (*m, self.method_counter(*m).load(Ordering::Relaxed)))
            .collect();
        let by_level = [
            (RiskLevel::Low, self.low.load(Ordering::Relaxed)),
            (RiskLevel::Medium, self.medium.load(Ordering::Relaxed)),
            (RiskLevel::High, self.high.load(Ordering::Relaxed)),
        ];

        let total_assessments: u64 = by_method.iter().map(|(_, n)| n).sum();
        let primary = self.primary.load(Ordering::Relaxed);
        let terminal_failures = self.terminal_failures.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        let total_requests = total_assessments + terminal_failures;

        let avg_latency = if total_requests > 0 {
            total_latency as f64 / total_requests as f64
        } else {
            0.0
        };

        let degraded_ratio = if total_assessments > 0 {
            (total_assessments - primary) as f64 / total_assessments as f64
        } else {
            0.0
        };

        TelemetryStats {
            total_assessments,
            assessments_by_method: by_method
                .into_iter()
                .map(|(m, n)| (m.as_str().to_string(), n))
                .collect(),
            assessments_by_level: by_level
                .into_iter()
                .map(|(l, n)| (l.as_str().to_string(), n))
                .collect(),
            terminal_failures,
            degraded_ratio,
            avg_latency_ms: avg_latency,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Reset counters (for new reporting period)
    pub fn reset(&self) {
        for counter in [
            &self.primary,
            &self.fallback,
            &self.emergency_fallback,
            &self.low,
            &self.medium,
            &self.high,
            &self.terminal_failures,
            &self.total_latency_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn method_counter(&self, method: AssessmentMethod) -> &AtomicU64 {
        match method {
            AssessmentMethod::Primary => &self.primary,
            AssessmentMethod::Fallback => &self.fallback,
            AssessmentMethod::EmergencyFallback => &self.emergency_fallback,
        }
    }

    fn level_counter(&self, level: RiskLevel) -> &AtomicU64 {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
