//! Error types for directory operations.
//!
//! Every failure the remote API can produce is converted into an [`Error`]
//! at the transport/client boundary. Errors are categorized so the retry
//! layer can decide what is worth another attempt, and so callers can log
//! something actionable.

use std::fmt;
use std::time::Duration;

use crate::types::{ApiRequest, ApiResponse, Method};

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of directory errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection-level failure (DNS, TLS, reset). Transient.
    Network,
    /// HTTP 429 from the remote service.
    RateLimited,
    /// HTTP 5xx from the remote service.
    Server,
    /// Any other non-2xx status (auth, not found, validation).
    Client,
    /// Response body could not be understood.
    Format,
    /// Client was constructed with invalid arguments.
    Config,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimited | Self::Server)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::RateLimited => "Rate limited by the remote service",
            Self::Server => "Remote service error",
            Self::Client => "Request rejected by the remote service",
            Self::Format => "Unexpected response format",
            Self::Config => "Invalid client configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::RateLimited => "Wait a moment and re-run, or lower the request volume",
            Self::Server => "The service may be degraded, try again later",
            Self::Client => "Check the token's permissions and the organization id",
            Self::Format => "The API may have changed; check the API base URL",
            Self::Config => "Provide a non-empty token and organization id",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the contexts API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP response.
    #[error("{method} {endpoint} failed: {message}")]
    Transport {
        /// HTTP method of the failed request.
        method: Method,
        /// Endpoint (path and query) of the failed request.
        endpoint: String,
        /// Transport error text.
        message: String,
    },

    /// The remote service answered with a non-2xx status.
    #[error("{method} {endpoint} returned HTTP {status}: {message}")]
    Api {
        /// HTTP method of the failed request.
        method: Method,
        /// Endpoint (path and query) of the failed request.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Remote `message` field, or the raw body when it is not JSON.
        message: String,
        /// Delay requested by a `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The response body could not be decoded.
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse {
        /// Endpoint (path and query) that produced the body.
        endpoint: String,
        /// What was wrong with the body.
        message: String,
    },

    /// Context creation succeeded at the HTTP level but returned no id.
    #[error("context '{name}' creation response did not contain an id")]
    MissingId {
        /// Name of the context that was being created.
        name: String,
    },

    /// Client construction arguments were rejected.
    #[error("invalid client configuration: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build an [`Error::Api`] from a non-2xx response.
    pub fn from_response(request: &ApiRequest, response: &ApiResponse) -> Self {
        Self::Api {
            method: request.method,
            endpoint: request.endpoint(),
            status: response.status,
            message: remote_message(&response.body),
            retry_after: response.retry_after,
        }
    }

    /// Build an [`Error::Transport`] for a request that got no response.
    pub fn transport(request: &ApiRequest, message: impl Into<String>) -> Self {
        Self::Transport {
            method: request.method,
            endpoint: request.endpoint(),
            message: message.into(),
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Network,
            Error::Api { status: 429, .. } => ErrorCategory::RateLimited,
            Error::Api { status, .. } if *status >= 500 => ErrorCategory::Server,
            Error::Api { .. } => ErrorCategory::Client,
            Error::InvalidResponse { .. } | Error::MissingId { .. } => ErrorCategory::Format,
            Error::InvalidArgument(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// HTTP status, when the remote answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-requested delay before the next attempt.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Extract a human-readable message from an error body.
///
/// CircleCI returns `{"message": "..."}`; anything else is reported verbatim.
fn remote_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "<empty body>".to_string()
    } else {
        trimmed.to_string()
    }
}
