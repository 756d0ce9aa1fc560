// Error handling framework
//
// Validation failures are not errors: they are reported as data through
// `validation::ValidationOutcome`.

use thiserror::Error;

/// Occurrence calculation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Unsupported cadence '{0}' (expected one of: daily, weekly, fortnightly, monthly)")]
    UnsupportedCadence(String),

    #[error("Occurrence for anchor {anchor} is outside the representable date range")]
    OutOfRange { anchor: String },
}

/// Errors raised while editing a definition field by name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Field '{field}' does not apply to {kind} tournaments")]
    NotApplicable { field: String, kind: String },
}

/// Local persistence errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Filesystem error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid JSON in {path}: {reason}")]
    InvalidJson { path: String, reason: String },

    #[error("No tournament at index {index} ({count} configured)")]
    NotFound { index: usize, count: usize },
}

/// Remote tournament service errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("401 Unauthorized - has setup been run with the correct API key?")]
    Unauthorized,

    #[error("Web request failed: {status} - {reason}")]
    RequestFailed { status: u16, reason: String },

    #[error("Request was still rate limited after {0} attempts")]
    RateLimited(u32),

    #[error("Unexpected response from remote service: {0}")]
    InvalidResponse(String),

    #[error("HTTP transport error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}
