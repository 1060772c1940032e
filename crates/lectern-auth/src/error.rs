//! Error types for the auth crate.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur in the credential lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential has been persisted; the user never logged in.
    #[error("Not authenticated. Run 'lectern login' first.")]
    NotFound,

    /// The callback presented a state token that does not match the one
    /// issued for this login attempt.
    #[error("OAuth state mismatch: callback rejected")]
    StateMismatch,

    /// No callback arrived within the wait window.
    #[error("Timed out waiting for the OAuth callback")]
    TimedOut,

    /// The authorization server reported an error in the callback
    /// (e.g. the user denied consent).
    #[error("Authorization was not granted: {0}")]
    ConsentDenied(String),

    /// The code exchange failed, or the credential could not be persisted
    /// after a successful exchange.
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The refresh token was rejected; the stored credential has been
    /// invalidated and the user must log in again.
    #[error("Session expired and could not be refreshed. Run 'lectern login' again.")]
    ReauthRequired,

    /// Network/transport error talking to the token endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// Credential storage failure.
    #[error("Credential storage error: {0}")]
    Store(String),

    /// Credential file exists but cannot be parsed.
    #[error("Credential serialization error: {0}")]
    Serialization(String),

    /// Missing or unusable OAuth client configuration.
    #[error("OAuth config error: {0}")]
    Config(String),

    /// The local callback listener could not be started.
    #[error("Callback listener error: {0}")]
    Listener(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.to_string())
    }
}
