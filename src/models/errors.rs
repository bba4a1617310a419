//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so degradations are easy to
//! follow in the logs.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - EXT_xxx: External predictor errors
//! - SCORER_xxx / ENGINE_xxx: Local engine errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Record an earlier failure as the cause, unless one is already set
    pub fn caused_by(mut self, earlier: AppError) -> Self {
        if self.source.is_none() {
            self.source = Some(Box::new(earlier));
        }
        self
    }

    /// Full cause chain for error bodies; the message when there is no source
    pub fn details(&self) -> String {
        let mut parts = Vec::new();
        let mut next = std::error::Error::source(self);
        while let Some(err) = next {
            parts.push(err.to_string());
            next = err.source();
        }

        if parts.is_empty() {
            self.message.clone()
        } else {
            parts.join(" <- ")
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // External Predictor Errors
    // ============================================
    /// Predictor did not answer within the timeout
    ExternalTimeout,
    /// Connection refused / DNS / TLS failure
    ExternalConnectionFailed,
    /// Predictor answered with a non-2xx status
    ExternalHttpStatus,
    /// Predictor answered 2xx but the payload cannot be interpreted
    ExternalMalformedResponse,

    // ============================================
    // Local Engine Errors
    // ============================================
    /// Local scorer failed or produced an invalid assessment
    ScorerFailed,
    /// Every tier failed
    TerminalFailure,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalTimeout => "EXT_TIMEOUT",
            Self::ExternalConnectionFailed => "EXT_CONNECTION_FAILED",
            Self::ExternalHttpStatus => "EXT_HTTP_STATUS",
            Self::ExternalMalformedResponse => "EXT_MALFORMED_RESPONSE",

            Self::ScorerFailed => "SCORER_FAILED",
            Self::TerminalFailure => "ENGINE_TERMINAL_FAILURE",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue => 400,
            Self::ApiRateLimited => 429,
            Self::ExternalTimeout
            | Self::ExternalConnectionFailed
            | Self::ExternalHttpStatus
            | Self::ExternalMalformedResponse => 503,
            _ => 500,
        }
    }

    /// Predictor could not be reached or refused the request (Tier 2 trigger)
    pub fn is_external_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ExternalTimeout | Self::ExternalConnectionFailed | Self::ExternalHttpStatus
        )
    }

    /// Predictor answered but its payload is unusable (Tier 3 trigger)
    pub fn is_malformed_external(&self) -> bool {
        matches!(self, Self::ExternalMalformedResponse)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn external_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalTimeout, msg)
    }

    pub fn external_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalConnectionFailed, msg)
    }

    pub fn external_status(status: u16) -> Self {
        Self::new(
            ErrorCode::ExternalHttpStatus,
            format!("Predictor returned HTTP {}", status),
        )
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalMalformedResponse, msg)
    }

    pub fn scorer_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScorerFailed, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            ErrorCode::ApiRateLimited,
            format!("Rate limit exceeded. Retry after {} seconds", retry_after_secs),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::with_source(ErrorCode::ExternalConnectionFailed, "Connection failed", err)
        } else if let Some(status) = err.status() {
            Self::external_status(status.as_u16())
        } else if err.is_decode() {
            Self::with_source(
                ErrorCode::ExternalMalformedResponse,
                "Failed to decode predictor response",
                err,
            )
        } else {
            // Request/body transport errors: predictor effectively unavailable
            Self::with_source(ErrorCode::ExternalConnectionFailed, err.to_string(), err)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ExternalMalformedResponse, "JSON parse error", err)
    }
}
