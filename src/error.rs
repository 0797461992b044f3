//! Error types for the toolbox services.
//!
//! This module defines `ToolboxError`, the unified error type returned by every
//! service method, the custom field resolver and the HTTP transport.
//!
//! # Security
//!
//! Error messages built from HTTP responses are sanitized so the API token is
//! never leaked. Use `sanitize_message()` when constructing messages from
//! external sources.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Reasons the custom object installer can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFailure {
    /// The current user is not an administrator.
    NoAdmin,
    /// The custom object could not be probed or created.
    CustomObjectNotEnabled,
    /// One of the custom object fields could not be created.
    CustomObjectCreation,
}

impl fmt::Display for SetupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            SetupFailure::NoAdmin => "no-admin",
            SetupFailure::CustomObjectNotEnabled => "custom-object-not-enabled",
            SetupFailure::CustomObjectCreation => "custom-object-creation-error",
        };
        f.write_str(code)
    }
}

/// Unified error type for all toolbox operations.
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: u16,
        /// The response body, potentially containing error details.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} ({operation})")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// Rate limited by the server (HTTP 429).
    #[error("rate limited by server - please wait before retrying")]
    RateLimited {
        /// Suggested retry delay, if provided by server.
        retry_after: Option<Duration>,
    },

    /// Server temporarily unavailable (HTTP 502/503/504).
    #[error("service temporarily unavailable ({status})")]
    ServiceUnavailable {
        /// The specific status code.
        status: u16,
    },

    /// The requested resource does not exist.
    #[error("{what} wasn't found.")]
    NotFound {
        /// What was searched for.
        what: String,
    },

    /// The operation does not support the given resource variant.
    #[error("{what} isn't supported.")]
    Unsupported {
        /// The unsupported variant.
        what: String,
    },

    /// A batch or argument was outside the allowed bounds.
    #[error("{0}")]
    Range(String),

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Some custom fields could not be resolved.
    #[error("Missing some custom fields, please check your installation. {}", fields.join(", "))]
    MissingCustomFields {
        /// Every identifier that was requested.
        fields: Vec<String>,
    },

    /// The host application rejected a request or lookup.
    #[error("host error: {0}")]
    Host(String),

    /// The custom object installer failed.
    #[error("custom object setup failed: {0}")]
    Setup(SetupFailure),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolboxError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        ToolboxError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ToolboxError::Config(message.into())
    }

    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        ToolboxError::NotFound { what: what.into() }
    }

    /// Creates an unsupported error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        ToolboxError::Unsupported { what: what.into() }
    }

    /// Creates a range error.
    pub fn range(message: impl Into<String>) -> Self {
        ToolboxError::Range(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ToolboxError::Validation(message.into())
    }

    /// Creates a missing custom fields error listing the requested identifiers.
    pub fn missing_custom_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolboxError::MissingCustomFields {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        ToolboxError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Returns true when the error means the resource does not exist.
    ///
    /// Both the typed `NotFound` variant and a raw HTTP 404 qualify.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            ToolboxError::NotFound { .. } => true,
            ToolboxError::HttpStatus { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// Returns true if this error is transient and the request may be retried.
    ///
    /// Retryable errors include:
    /// - Rate limiting (HTTP 429)
    /// - Service unavailable (HTTP 502, 503, 504)
    /// - Timeouts
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ToolboxError::RateLimited { .. } => true,
            ToolboxError::ServiceUnavailable { .. } => true,
            ToolboxError::Timeout { .. } => true,
            ToolboxError::Http(e) => e.is_timeout() || e.is_connect(),
            ToolboxError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this is a rate limit error, indicating we should back off.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ToolboxError::RateLimited { .. })
            || matches!(self, ToolboxError::HttpStatus { status, .. } if *status == 429)
    }

    /// Returns the suggested delay before retry, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ToolboxError::RateLimited { retry_after } => *retry_after,
            ToolboxError::ServiceUnavailable { .. } => Some(Duration::from_millis(500)),
            ToolboxError::Timeout { .. } => Some(Duration::from_millis(100)),
            _ => None,
        }
    }

    /// Replaces any occurrence of `secret` in `message` with `[REDACTED]`.
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }
}
