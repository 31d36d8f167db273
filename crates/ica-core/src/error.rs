//! Error types for the ICA shopping-list synchronizer
//!
//! This module defines all error types used throughout the crate, plus the
//! user-facing [`SetupError`] classification used when credentials are
//! validated at setup time.

use thiserror::Error;

/// Result type alias for ICA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ICA shopping-list synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// The remote rejected the credentials or ticket (HTTP 401), or the
    /// login response carried no ticket
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The remote answered with a non-2xx status other than 401
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// Status code returned by the remote
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The request never produced a status (connect, TLS, timeout, decode)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A list or row was not found in the coordinator cache
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A scheduled refresh failed; the host retries on the next tick
    #[error("Error communicating with API: {0}")]
    UpdateFailed(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a status error from a non-2xx response
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a failure at the scheduled-refresh boundary
    pub fn update_failed(source: &Error) -> Self {
        Self::UpdateFailed(source.to_string())
    }

    /// Whether this error means the credentials were rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// User-facing classification of a setup failure
///
/// Produced when credentials are validated by attempting one list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// The remote answered 401
    InvalidCredentials,
    /// Any other HTTP or transport failure
    CannotConnect,
    /// Anything else
    Unknown,
}

impl SetupError {
    /// Stable key shown next to the credential fields
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupError::InvalidCredentials => "invalid_credentials",
            SetupError::CannotConnect => "cannot_connect",
            SetupError::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Error> for SetupError {
    fn from(err: &Error) -> Self {
        match err {
            Error::Authentication(_) => SetupError::InvalidCredentials,
            Error::HttpStatus { status: 401, .. } => SetupError::InvalidCredentials,
            Error::HttpStatus { .. } | Error::Http(_) | Error::Network(_) => {
                SetupError::CannotConnect
            }
            _ => SetupError::Unknown,
        }
    }
}
