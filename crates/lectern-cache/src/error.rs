//! Error types for the response cache.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur in cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Local storage failure (reported, not retried).
    #[error("Cache storage error: {0}")]
    Io(String),

    /// Entry could not be serialized or parsed.
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}
