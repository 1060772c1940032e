//! OAuth 2.0 authorization-code flow against the Google endpoints.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;

use crate::credential::Credential;
use crate::error::{AuthError, Result};

/// OAuth client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Validate that the client credentials are present.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AuthError::Config(
                "OAuth client_id/client_secret are not configured; \
                 set them in config.toml under [oauth]"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the consent URL for the authorization endpoint.
///
/// `access_type=offline` asks for a refresh token; `prompt=consent` forces
/// the consent screen so a refresh token is issued even on re-login.
pub fn build_consent_url(config: &OAuthConfig, state: &str) -> String {
    let scopes = config.scopes.join(" ");
    let params = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", scopes.as_str()),
        ("access_type", "offline"),
        ("prompt", "consent"),
        ("state", state),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Token endpoint response for both exchange and refresh.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    scope: String,
}

impl TokenResponse {
    fn into_credential(self) -> Credential {
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in as i64),
            scopes: self
                .scope
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Exchange an authorization code for a credential.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
) -> Result<Credential> {
    let params = [
        ("code", code),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = http
        .post(&config.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("Token exchange request failed: {}", e)))?;

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AuthError::ExchangeFailed(error_text));
    }

    let tokens: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::ExchangeFailed(format!("Failed to parse token response: {}", e)))?;

    Ok(tokens.into_credential())
}

/// Renew an access token using a refresh token.
///
/// A rejection from the token endpoint (revoked or invalid grant) maps to
/// [`AuthError::ReauthRequired`]; the caller owns invalidating the stored
/// credential. Transport failures stay [`AuthError::Network`] so a flaky
/// connection does not destroy a credential that may still be good.
pub async fn refresh_credential(
    http: &reqwest::Client,
    config: &OAuthConfig,
    refresh_token: &str,
) -> Result<Credential> {
    if refresh_token.is_empty() {
        return Err(AuthError::ReauthRequired);
    }

    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response = http
        .post(&config.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("Token refresh request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = %status, body = %error_text, "Token refresh rejected");
        return Err(AuthError::ReauthRequired);
    }

    let tokens: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::Network(format!("Failed to parse refresh response: {}", e)))?;

    let mut credential = tokens.into_credential();
    // Google omits the refresh token on renewal; carry the existing one.
    if credential.refresh_token.is_empty() {
        credential.refresh_token = refresh_token.to_string();
    }

    Ok(credential)
}
