//! Error types and handling for Elektra
//!
//! This module defines the error taxonomy used throughout the integration:
//! the crate-wide [`ElektraError`] with one variant per failure class, and
//! the [`RefreshFailed`] boundary type the coordinator reports to the host.

use thiserror::Error;

/// Result type alias for Elektra operations
pub type Result<T> = std::result::Result<T, ElektraError>;

/// Main error type for Elektra
#[derive(Debug, Error)]
pub enum ElektraError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Credentials rejected or unexpected token-endpoint status
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Transport-level failures (DNS, TLS, connection reset)
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Upstream call exceeded its time bound
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Response decoded but violates the documented API shape
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Successful envelope with no price records
    #[error("Empty result: {message}")]
    EmptyResult { message: String },

    /// Price series has no entry for the exact current hour
    #[error("Missing current hour: {message}")]
    MissingCurrentHour { message: String },

    /// Requested data does not exist (service lookups)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ElektraError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ElektraError::Config {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        ElektraError::Auth {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        ElektraError::Connection {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        ElektraError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        ElektraError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new empty-result error
    pub fn empty_result<S: Into<String>>(message: S) -> Self {
        ElektraError::EmptyResult {
            message: message.into(),
        }
    }

    /// Create a new missing-current-hour error
    pub fn missing_current_hour<S: Into<String>>(message: S) -> Self {
        ElektraError::MissingCurrentHour {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        ElektraError::NotFound {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ElektraError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ElektraError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        ElektraError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ElektraError {
    fn from(err: std::io::Error) -> Self {
        ElektraError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ElektraError {
    fn from(err: serde_yaml::Error) -> Self {
        ElektraError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ElektraError {
    fn from(err: serde_json::Error) -> Self {
        ElektraError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for ElektraError {
    fn from(err: chrono::ParseError) -> Self {
        ElektraError::validation("datetime", &err.to_string())
    }
}

// Timeouts are a distinct failure class for the host's retry surface, so the
// reqwest mapping must not fold them into plain connection errors.
impl From<reqwest::Error> for ElektraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ElektraError::timeout(err.to_string())
        } else {
            ElektraError::connection(err.to_string())
        }
    }
}

/// Failure class reported to the host alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    Connection,
    Timeout,
    Protocol,
    EmptyResult,
    MissingCurrentHour,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::EmptyResult => "empty_result",
            Self::MissingCurrentHour => "missing_current_hour",
            Self::Other => "other",
        }
    }

    /// Whether the host should keep retrying on its fixed schedule.
    /// Auth failures need user action instead.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Auth)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single failure type reported at the coordinator boundary
///
/// Carries the originating [`FailureKind`] so hosts can branch on the failure
/// class without string matching.
#[derive(Debug, Clone, Error)]
#[error("Refresh failed ({kind}): {message}")]
pub struct RefreshFailed {
    pub kind: FailureKind,
    pub message: String,
}

impl From<ElektraError> for RefreshFailed {
    fn from(err: ElektraError) -> Self {
        let (kind, message) = match err {
            ElektraError::Auth { message } => (FailureKind::Auth, message),
            ElektraError::Connection { message } => (FailureKind::Connection, message),
            ElektraError::Timeout { message } => (FailureKind::Timeout, message),
            ElektraError::Protocol { message } => (FailureKind::Protocol, message),
            ElektraError::EmptyResult { message } => (FailureKind::EmptyResult, message),
            ElektraError::MissingCurrentHour { message } => {
                (FailureKind::MissingCurrentHour, message)
            }
            other => (FailureKind::Other, other.to_string()),
        };
        RefreshFailed { kind, message }
    }
}

impl From<RefreshFailed> for ElektraError {
    fn from(failure: RefreshFailed) -> Self {
        match failure.kind {
            FailureKind::Auth => ElektraError::auth(failure.message),
            FailureKind::Connection => ElektraError::connection(failure.message),
            FailureKind::Timeout => ElektraError::timeout(failure.message),
            FailureKind::Protocol => ElektraError::protocol(failure.message),
            FailureKind::EmptyResult => ElektraError::empty_result(failure.message),
            FailureKind::MissingCurrentHour => {
                ElektraError::missing_current_hour(failure.message)
            }
            FailureKind::Other => ElektraError::generic(failure.message),
        }
    }
}
