//! Error types shared by the directory and contact-list adapters.
//!
//! Directory write failures carry a classification (validation, permission,
//! availability) rather than collapsing to a boolean, so callers can decide
//! whether a failed add/modify is retryable, a data problem, or an access
//! problem.

use thiserror::Error;

/// Main error type for dirsync operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The remote service could not be reached or is temporarily down.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request was malformed or referenced a nonexistent object.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Bind or basic-auth credentials were rejected.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The authenticated identity lacks the required access rights.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The directory rejected the data (schema, syntax or constraint
    /// violation).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A uniqueness or integrity invariant was violated (entry already
    /// exists, duplicate uid).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// A response could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failure reported by an external service.
    #[error("External service error: {service}: {message}")]
    ExternalServiceError {
        /// Service name that failed.
        service: String,
        /// Error message.
        message: String,
    },
}

/// Specialized result type for dirsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the stable error code for this error kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Returns true if the operation may succeed when retried later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::Timeout(_))
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
