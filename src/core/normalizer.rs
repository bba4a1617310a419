//! Feature Normalizer
//!
//! Turns an arbitrary JSON record into a complete `BusinessMetrics`.
//! Missing, non-numeric or unparsable fields fall back to their defaults.
//! There is no error path.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::types::BusinessMetrics;
use crate::utils::constants::{NEUTRAL_SCALE_SCORE, SCALE_MAX, SCALE_MIN};

/// Normalize a raw record. Non-object input yields all defaults.
pub fn normalize(record: &Value) -> BusinessMetrics {
    let empty = Map::new();
    let fields = record.as_object().unwrap_or(&empty);
    let mut defaulted: Vec<&'static str> = Vec::new();

    let mut float = |key: &'static str| -> f64 {
        float_field(fields, key).unwrap_or_else(|| {
            defaulted.push(key);
            0.0
        })
    };

    let revenue = float("revenue");
    let expenses = float("expenses");
    let cash_flow = float("cashFlow");
    let debt = float("debt");
    let assets = float("assets");
    let market_growth = float("marketGrowth");
    let customer_retention = float("customerRetention");

    let mut count = |key: &'static str| -> u32 {
        match int_field(fields, key) {
            // `as` saturates: negatives become 0
            Some(value) => value as u32,
            None => {
                defaulted.push(key);
                0
            }
        }
    };

    let employee_count = count("employeeCount");
    let years_in_business = count("yearsInBusiness");

    let mut scale = |key: &'static str| -> u8 {
        match int_field(fields, key).filter(|value| *value != 0.0) {
            Some(value) => value.clamp(SCALE_MIN as f64, SCALE_MAX as f64) as u8,
            None => {
                defaulted.push(key);
                NEUTRAL_SCALE_SCORE
            }
        }
    };

    let competition_level = scale("competitionLevel");
    let digital_presence = scale("digitalPresence");
    let innovation_score = scale("innovationScore");

    if !defaulted.is_empty() {
        debug!(fields = ?defaulted, "Defaulted {} metric field(s)", defaulted.len());
    }

    BusinessMetrics {
        revenue,
        expenses,
        cash_flow,
        debt,
        assets,
        employee_count,
        years_in_business,
        market_growth,
        customer_retention,
        competition_level,
        digital_presence,
        innovation_score,
    }
}

fn float_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Integer fields truncate toward zero
fn int_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match fields.get(key)? {
        Value::Number(n) => n.as_f64().map(f64::trunc),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Parse the longest numeric prefix of `s`: "12.5abc" -> 12.5, "abc" -> None
fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let mut literal = s[..end].to_string();
    if literal.ends_with('.') {
        literal.push('0');
    }
    literal = literal.replacen("-.", "-0.", 1).replacen("+.", "+0.", 1);
    if literal.starts_with('.') {
        literal.insert(0, '0');
    }
    literal.parse::<f64>().ok()
}

fn parse_leading_int(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<f64>().ok()
}
