//! Configuration for the risk engine and API server
//!
//! Values come from the environment once at startup and are then passed
//! explicitly into the orchestrators and the router.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_BATCH_CONCURRENCY, DEFAULT_BATCH_TIMEOUT_MS, DEFAULT_HOST,
    DEFAULT_INTERACTIVE_TIMEOUT_MS, DEFAULT_ML_SERVICE_URL, DEFAULT_PORT, ENV_BATCH_CONCURRENCY,
    ENV_HOST, ENV_ML_BATCH_TIMEOUT_MS, ENV_ML_SERVICE_TIMEOUT_MS, ENV_ML_SERVICE_URL,
    ENV_PLATFORM_PORT, ENV_PORT, MAX_BATCH_CONCURRENCY, PREDICT_PATH,
};

/// Engine configuration: where the predictor lives and how long to wait for it
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Base URL of the ML prediction service
    pub ml_service_url: String,
    /// Timeout for the interactive (single record) path
    pub interactive_timeout: Duration,
    /// Timeout for the deferred/batch path
    pub batch_timeout: Duration,
    /// Concurrent assessments per batch request
    pub batch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ml_service_url: DEFAULT_ML_SERVICE_URL.to_string(),
            interactive_timeout: Duration::from_millis(DEFAULT_INTERACTIVE_TIMEOUT_MS),
            batch_timeout: Duration::from_millis(DEFAULT_BATCH_TIMEOUT_MS),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

impl EngineConfig {
    /// Load from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, map in tests)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ml_service_url = lookup(ENV_ML_SERVICE_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.ml_service_url);

        let interactive_timeout = match lookup(ENV_ML_SERVICE_TIMEOUT_MS) {
            Some(raw) => parse_timeout(ENV_ML_SERVICE_TIMEOUT_MS, &raw)?,
            None => defaults.interactive_timeout,
        };

        let batch_timeout = match lookup(ENV_ML_BATCH_TIMEOUT_MS) {
            Some(raw) => parse_timeout(ENV_ML_BATCH_TIMEOUT_MS, &raw)?,
            None => defaults.batch_timeout,
        };

        let batch_concurrency = match lookup(ENV_BATCH_CONCURRENCY) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| {
                    AppError::invalid_config(format!(
                        "{} must be a positive integer, got {:?}",
                        ENV_BATCH_CONCURRENCY, raw
                    ))
                })?
                .clamp(1, MAX_BATCH_CONCURRENCY),
            None => defaults.batch_concurrency,
        };

        info!(
            "⚙️ Engine config: predictor={}, interactive={}ms, batch={}ms, concurrency={}",
            ml_service_url,
            interactive_timeout.as_millis(),
            batch_timeout.as_millis(),
            batch_concurrency
        );

        Ok(Self {
            ml_service_url,
            interactive_timeout,
            batch_timeout,
            batch_concurrency,
        })
    }

    /// Full prediction endpoint (`<base>/predict`)
    pub fn predict_endpoint(&self) -> String {
        if self.ml_service_url.ends_with(PREDICT_PATH) {
            self.ml_service_url.clone()
        } else {
            format!("{}{}", self.ml_service_url, PREDICT_PATH)
        }
    }
}

fn parse_timeout(key: &str, raw: &str) -> AppResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(AppError::invalid_config(format!(
            "{} must be a positive number of milliseconds, got {:?}",
            key, raw
        ))),
    }
}

/// HTTP server bind configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Render/Railway set PORT; BEACON_PORT is for local runs
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(ENV_PLATFORM_PORT).or_else(|| lookup(ENV_PORT)) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AppError::invalid_config(format!("Invalid port value: {:?}", raw))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }

    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| AppError::invalid_config(format!("Invalid bind address {}:{}", self.host, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.interactive_timeout, Duration::from_secs(5));
        assert_eq!(config.batch_timeout, Duration::from_secs(10));
        assert_eq!(config.predict_endpoint(), "http://localhost:8000/predict");
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("ML_SERVICE_URL", "https://ml.example.com/"),
            ("ML_SERVICE_TIMEOUT_MS", "2500"),
            ("ML_BATCH_TIMEOUT_MS", "8000"),
            ("BEACON_BATCH_CONCURRENCY", "500"),
        ]))
        .unwrap();

        assert_eq!(config.predict_endpoint(), "https://ml.example.com/predict");
        assert_eq!(config.interactive_timeout, Duration::from_millis(2500));
        assert_eq!(config.batch_timeout, Duration::from_millis(8000));
        assert_eq!(config.batch_concurrency, MAX_BATCH_CONCURRENCY);
    }

    #[test]
    fn test_endpoint_already_has_predict_path() {
        let config = EngineConfig::from_lookup(lookup_from(&[(
            "ML_SERVICE_URL",
            "http://ml:8000/predict",
        )]))
        .unwrap();
        assert_eq!(config.predict_endpoint(), "http://ml:8000/predict");
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("ML_SERVICE_TIMEOUT_MS", "fast")]))
            .unwrap_err();
        assert_eq!(err.code_str(), "CFG_INVALID_VALUE");

        let err = EngineConfig::from_lookup(lookup_from(&[("ML_BATCH_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert_eq!(err.code_str(), "CFG_INVALID_VALUE");
    }

    #[test]
    fn test_server_port_precedence() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("PORT", "9000"), ("BEACON_PORT", "7000")]))
                .unwrap();
        assert_eq!(config.port, 9000);

        let config = ServerConfig::from_lookup(lookup_from(&[("BEACON_PORT", "7000")])).unwrap();
        assert_eq!(config.port, 7000);
        assert!(config.socket_addr().is_ok());

        assert!(ServerConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
    }
}
