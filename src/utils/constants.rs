//! Constants Module - Single Source of Truth
//!
//! Every weight, threshold, default and environment variable name used by
//! the engine lives here. No magic numbers in the scoring or config code.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "BeaconRisk";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound predictor requests
pub const USER_AGENT: &str = concat!("BeaconRisk/", env!("CARGO_PKG_VERSION"));

// ============================================
// EXTERNAL PREDICTOR
// ============================================

/// Default base URL of the ML prediction service
pub const DEFAULT_ML_SERVICE_URL: &str = "http://localhost:8000";

/// Path appended to the base URL
pub const PREDICT_PATH: &str = "/predict";

/// Interactive path timeout (milliseconds)
pub const DEFAULT_INTERACTIVE_TIMEOUT_MS: u64 = 5_000;

/// Deferred/batch path timeout (milliseconds)
pub const DEFAULT_BATCH_TIMEOUT_MS: u64 = 10_000;

/// Default concurrent assessments per batch request
pub const DEFAULT_BATCH_CONCURRENCY: usize = 10;

/// Upper bound on batch concurrency
pub const MAX_BATCH_CONCURRENCY: usize = 50;

/// Maximum records per batch request
pub const MAX_BATCH_RECORDS: usize = 100;

// ============================================
// ENVIRONMENT VARIABLES
// ============================================

pub const ENV_ML_SERVICE_URL: &str = "ML_SERVICE_URL";
pub const ENV_ML_SERVICE_TIMEOUT_MS: &str = "ML_SERVICE_TIMEOUT_MS";
pub const ENV_ML_BATCH_TIMEOUT_MS: &str = "ML_BATCH_TIMEOUT_MS";
pub const ENV_BATCH_CONCURRENCY: &str = "BEACON_BATCH_CONCURRENCY";
pub const ENV_HOST: &str = "BEACON_HOST";
pub const ENV_PORT: &str = "BEACON_PORT";
/// Platform-provided port (Render/Railway), takes precedence over BEACON_PORT
pub const ENV_PLATFORM_PORT: &str = "PORT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;

// ============================================
// NORMALIZER DEFAULTS
// ============================================

/// Neutral value for the 1-10 scale metrics
pub const NEUTRAL_SCALE_SCORE: u8 = 5;
pub const SCALE_MIN: u8 = 1;
pub const SCALE_MAX: u8 = 10;

// ============================================
// SCORING WEIGHTS (share of the 0-100 scale)
// ============================================

pub const FINANCIAL_WEIGHT: f64 = 0.40;
pub const MATURITY_WEIGHT: f64 = 0.20;
pub const MARKET_WEIGHT: f64 = 0.25;
pub const INNOVATION_WEIGHT: f64 = 0.15;

/// Sub-score caps, applied before weighting
pub const FINANCIAL_SUB_MAX: f64 = 40.0;
pub const MATURITY_SUB_MAX: f64 = 25.0;
pub const MARKET_SUB_MAX: f64 = 25.0;
pub const INNOVATION_SUB_MAX: f64 = 15.0;

/// Level thresholds on the normalized 0-1 scale
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;
pub const HIGH_RISK_THRESHOLD: f64 = 0.60;

// ============================================
// RISK FACTOR LABELS
// ============================================

pub const FACTOR_NEGATIVE_PROFIT: &str = "Negative profit margin";
pub const FACTOR_LOW_PROFIT: &str = "Low profit margin";
pub const FACTOR_HIGH_DEBT: &str = "High debt-to-asset ratio";
pub const FACTOR_NEGATIVE_CASH_FLOW: &str = "Negative cash flow";
pub const FACTOR_POOR_CASH_FLOW: &str = "Poor cash flow";
pub const FACTOR_VERY_NEW: &str = "Very new business";
pub const FACTOR_YOUNG: &str = "Young business";
pub const FACTOR_SMALL_TEAM: &str = "Very small team";
pub const FACTOR_DECLINING_MARKET: &str = "Declining market";
pub const FACTOR_SLOW_GROWTH: &str = "Slow market growth";
pub const FACTOR_HIGH_COMPETITION: &str = "High competition";
pub const FACTOR_POOR_RETENTION: &str = "Poor customer retention";
pub const FACTOR_LOW_DIGITAL: &str = "Low digital presence";
pub const FACTOR_LOW_INNOVATION: &str = "Low innovation capacity";

// ============================================
// STRICT (MODEL-ONLY) PATH
// ============================================

/// Fields the model-only endpoint refuses to default
pub const STRICT_REQUIRED_FIELDS: [&str; 5] = [
    "revenue",
    "expenses",
    "cashFlow",
    "employeeCount",
    "yearsInBusiness",
];
