//! Login orchestration and credential freshness.
//!
//! The authenticator owns the authorization-code flow end to end: consent
//! URL, callback receipt, code exchange, and refresh. Refresh is
//! single-flight: concurrent callers that find the credential expired wait
//! on one in-flight renewal and share its outcome, because redundant remote
//! refreshes can invalidate the refresh token out from under each other.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::callback;
use crate::credential::Credential;
use crate::error::{AuthError, Result};
use crate::flow::{self, OAuthConfig};
use crate::store::SharedTokenStore;

/// A single login attempt: the anti-forgery state and the URL to present.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub state: String,
    pub consent_url: String,
}

/// Point-in-time summary of the stored credential, for display.
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub expires_in_secs: i64,
    pub is_expired: bool,
    pub is_refreshable: bool,
    pub scopes: Vec<String>,
}

/// Owns the OAuth flow and the credential lifecycle.
#[derive(Debug)]
pub struct Authenticator {
    config: OAuthConfig,
    store: SharedTokenStore,
    http: reqwest::Client,
    callback_port: u16,
    callback_timeout: Duration,
    refresh_lock: Mutex<()>,
}

impl Authenticator {
    pub fn new(
        config: OAuthConfig,
        store: SharedTokenStore,
        callback_port: u16,
        callback_timeout: Duration,
    ) -> Self {
        Self {
            config,
            store,
            http: reqwest::Client::new(),
            callback_port,
            callback_timeout,
            refresh_lock: Mutex::new(()),
        }
    }

    /// The store backing this authenticator.
    pub fn store(&self) -> &SharedTokenStore {
        &self.store
    }

    /// Start a login attempt: a fresh anti-forgery state bound to this
    /// attempt, and the consent URL embedding it.
    pub fn begin_login(&self) -> Result<LoginAttempt> {
        self.config.validate()?;
        let state = flow::generate_state();
        let consent_url = flow::build_consent_url(&self.config, &state);
        Ok(LoginAttempt { state, consent_url })
    }

    /// Wait for the browser callback belonging to `attempt`.
    ///
    /// Accepts exactly one callback; the listener is torn down afterward
    /// regardless of outcome.
    pub async fn await_callback(
        &self,
        attempt: &LoginAttempt,
        cancel: &CancellationToken,
    ) -> Result<String> {
        callback::await_callback(
            self.callback_port,
            &attempt.state,
            self.callback_timeout,
            cancel,
        )
        .await
    }

    /// Exchange an authorization code and persist the resulting credential.
    ///
    /// If persistence fails after the remote side issued a token, the
    /// failure is surfaced as `ExchangeFailed` rather than swallowed: the
    /// remote session exists but the client has no usable record of it.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential> {
        let credential = flow::exchange_code(&self.http, &self.config, code).await?;

        if let Err(e) = self.store.save(&credential).await {
            return Err(AuthError::ExchangeFailed(format!(
                "token issued but could not be persisted: {}",
                e
            )));
        }

        tracing::info!("Login complete, credential persisted");
        Ok(credential)
    }

    /// Return a credential that is valid right now, refreshing at most once
    /// if the stored one has expired.
    ///
    /// Concurrent callers serialize on the refresh: whoever arrives while a
    /// renewal is in flight waits for it and reuses the persisted result
    /// instead of issuing a duplicate remote refresh.
    pub async fn ensure_fresh(&self, cancel: &CancellationToken) -> Result<Credential> {
        let credential = self.store.load().await?;
        if !credential.is_expired() {
            return Ok(credential);
        }

        let _guard = self.refresh_lock.lock().await;

        // Re-check under the lock: a concurrent caller may have completed
        // the refresh while we waited.
        let credential = self.store.load().await?;
        if !credential.is_expired() {
            return Ok(credential);
        }

        if cancel.is_cancelled() {
            return Err(AuthError::Cancelled);
        }

        tracing::info!("Access token expired, refreshing");
        let refreshed = tokio::select! {
            result = flow::refresh_credential(&self.http, &self.config, &credential.refresh_token) => result,
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
        };

        match refreshed {
            Ok(renewed) => {
                self.store
                    .save(&renewed)
                    .await
                    .map_err(|e| AuthError::Store(format!("refreshed token not persisted: {}", e)))?;
                tracing::info!("Token refreshed");
                Ok(renewed)
            }
            Err(AuthError::ReauthRequired) => {
                // Never leave a known-bad credential looking current.
                self.invalidate().await;
                Err(AuthError::ReauthRequired)
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the stored credential so later calls go through login instead
    /// of replaying a known-bad token.
    pub async fn invalidate(&self) {
        if let Err(e) = self.store.delete().await {
            tracing::warn!(error = %e, "Failed to delete invalidated credential");
        }
    }

    /// Delete the persisted credential unconditionally.
    pub async fn logout(&self) -> Result<()> {
        self.store.delete().await
    }

    /// Whether a usable (valid or refreshable) credential exists.
    pub async fn is_authenticated(&self) -> bool {
        self.store.is_authenticated().await
    }

    /// Summary of the stored credential, or `None` if never logged in.
    pub async fn status(&self) -> Result<Option<AuthStatus>> {
        match self.store.load().await {
            Ok(c) => Ok(Some(AuthStatus {
                expires_at: c.expires_at,
                expires_in_secs: c.expires_in_secs(),
                is_expired: c.is_expired(),
                is_refreshable: c.is_refreshable(),
                scopes: c.scopes,
            })),
            Err(AuthError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
