//! OAuth 2.0 credential lifecycle for the lectern classroom client.
//!
//! Covers the authorization-code flow (consent URL, localhost callback,
//! code exchange), credential persistence with atomic owner-only writes,
//! and single-flight refresh of expired access tokens.

mod authenticator;
mod callback;
mod credential;
mod error;
mod flow;
mod store;

pub use authenticator::{AuthStatus, Authenticator, LoginAttempt};
pub use credential::Credential;
pub use error::{AuthError, Result};
pub use flow::OAuthConfig;
pub use store::{
    CREDENTIAL_FILE, FileTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore,
};
