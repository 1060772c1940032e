//! Typed error taxonomy for the API client.
//!
//! Every failure the data layer can produce is one of these classes, so
//! the presentation layer branches on cause and offers a next step without
//! ever pattern-matching message text.

use std::time::Duration;

use lectern_auth::AuthError;
use lectern_cache::CacheError;
use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error type for API client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential exists; the user must log in.
    #[error("Not authenticated")]
    AuthRequired,

    /// The credential expired and could not be refreshed; the stored
    /// credential has been invalidated and a new login is needed.
    #[error("Session expired")]
    AuthExpired,

    /// Miscellaneous authentication failure (storage, configuration).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The remote rate-limited the request. Retried internally; surfaced
    /// only once the attempt budget is spent.
    #[error("Rate limited by the remote service")]
    RateLimited {
        /// Server-suggested wait before retrying, if it sent one.
        retry_after: Option<Duration>,
    },

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The signed-in identity may not access the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The remote rejected the request as malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 5xx-class failure on the remote side.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Transport-level failure (timeout, connection reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The remote payload is missing required fields or is malformed.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Local cache storage failure.
    #[error("Cache error: {0}")]
    CacheIo(String),

    /// The retry budget was spent without a success; carries the last
    /// underlying failure.
    #[error("Gave up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Whether the client's retry loop may try this failure again.
    /// Only rate limiting and transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. } | ApiError::Network(_))
    }

    /// Server-suggested wait, if this is a rate-limit failure carrying one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// An actionable next step for the user, renderable next to
    /// [`std::fmt::Display`] output.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ApiError::AuthRequired | ApiError::AuthExpired | ApiError::Auth(_) => {
                "Run 'lectern login' to authenticate."
            }
            ApiError::RateLimited { .. } => "Wait a few seconds and retry.",
            ApiError::NotFound(_) => "The item may have been removed; refresh the view.",
            ApiError::Forbidden(_) => "Ask the course owner for access.",
            ApiError::InvalidRequest(_) | ApiError::Decode(_) => {
                "This looks like a client defect; please report it."
            }
            ApiError::ServerError { .. } => "The service is having trouble; try again later.",
            ApiError::Network(_) => "Check your internet connection.",
            ApiError::CacheIo(_) => {
                "Check the cache directory permissions, or run 'lectern cache clear'."
            }
            ApiError::ExhaustedRetries { last, .. } => last.suggestion(),
            ApiError::Cancelled => "Retry the action.",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NotFound => ApiError::AuthRequired,
            AuthError::ReauthRequired => ApiError::AuthExpired,
            AuthError::Cancelled => ApiError::Cancelled,
            AuthError::Network(msg) => ApiError::Network(msg),
            other => ApiError::Auth(other.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        ApiError::CacheIo(e.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
