//! Error types for the shopkit core library
//!
//! This module defines the error handling system for shopkit, using thiserror
//! for ergonomic error definitions and anyhow for flexible error contexts.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Main error type for shopkit operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input detected at construction time (credentials, domains, methods)
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// One or more required parameters were not supplied
    #[error("One or more of required (\"{}\") parameters is missing", .required.join("\", \""))]
    MissingArgument { required: Vec<String> },

    /// Network or connection level failure reported by the transport
    #[error("Transport failure: {message}")]
    Transport {
        message: String,
        timeout: bool,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote API rate limit was exceeded
    #[error("API rate limit exceeded (limit: {limit}, retry in {reset:?})")]
    RateLimitExceeded { limit: u32, reset: Duration },

    /// The remote API rejected the request payload
    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        errors: Option<Value>,
    },

    /// Any other non-2xx answer from the remote API
    #[error("HTTP error [{status}]: {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// A redirect chain was longer than the configured maximum
    #[error("Too many redirects (max: {max}), last location: {location}")]
    TooManyRedirects { max: usize, location: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad input, never retried
    InvalidArgument,
    /// Network level failure
    Transport,
    /// Rate limit exceeded, retryable after the reset delay
    RateLimit,
    /// Remote validation rejected the request
    Validation,
    /// Other remote API failure
    Api,
    /// Local configuration problem
    Configuration,
    /// Anything else
    Internal,
}

impl Error {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for a `Configuration` error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a `Transport` error without a source
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            timeout: false,
            source: None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } | Error::MissingArgument { .. } => {
                ErrorKind::InvalidArgument
            }
            Error::Transport { .. } => ErrorKind::Transport,
            Error::RateLimitExceeded { .. } => ErrorKind::RateLimit,
            Error::ValidationFailed { .. } => ErrorKind::Validation,
            Error::Api { .. } | Error::TooManyRedirects { .. } => ErrorKind::Api,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Json { .. } | Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether this is a rate-limit failure
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }

    /// The cooldown carried by a rate-limit failure
    pub fn reset_delay(&self) -> Option<Duration> {
        match self {
            Error::RateLimitExceeded { reset, .. } => Some(*reset),
            _ => None,
        }
    }

    /// HTTP status associated with the failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RateLimitExceeded { .. } => Some(429),
            Error::ValidationFailed { .. } => Some(422),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "invalid_argument"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::RateLimit => write!(f, "rate_limit"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Api => write!(f, "api"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport {
            message: err.to_string(),
            timeout: err.is_timeout(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
