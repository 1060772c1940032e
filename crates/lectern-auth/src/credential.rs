//! The persisted OAuth credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Slack subtracted from the expiry when deciding whether to refresh, so a
/// token is renewed before it lapses mid-request.
const EXPIRY_SLACK_SECS: i64 = 5 * 60;

/// The OAuth credential for the one signed-in identity.
///
/// Exactly one of these exists at a time, owned by the token store. It is
/// created on code exchange, mutated in place on refresh, and destroyed on
/// logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token attached to API requests.
    pub access_token: String,

    /// Long-lived token used to obtain a new access token. May be empty if
    /// the authorization server declined to issue one.
    #[serde(default)]
    pub refresh_token: String,

    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,

    /// Scopes granted at consent time.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Whether the access token has expired (with slack, so callers refresh
    /// slightly early rather than race the deadline).
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock, for tests.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_SLACK_SECS)
    }

    /// Whether this credential can be renewed without user interaction.
    /// A non-empty refresh token is refreshable regardless of expiry.
    pub fn is_refreshable(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Whether this credential is unusable without a fresh login: expired
    /// with no refresh token.
    pub fn is_terminal(&self) -> bool {
        self.is_expired() && !self.is_refreshable()
    }

    /// Seconds until expiry, or 0 if already past.
    pub fn expires_in_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expires_at: DateTime<Utc>, refresh: &str) -> Credential {
        Credential {
            access_token: "at".to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
            scopes: vec![],
        }
    }

    #[test]
    fn test_expiry_with_slack() {
        let now = Utc::now();

        // Plenty of time left.
        let fresh = credential(now + Duration::hours(1), "rt");
        assert!(!fresh.is_expired());

        // Inside the slack window counts as expired.
        let expiring = credential(now + Duration::minutes(2), "rt");
        assert!(expiring.is_expired());

        // Already past.
        let stale = credential(now - Duration::minutes(1), "rt");
        assert!(stale.is_expired());
    }

    #[test]
    fn test_refreshable_regardless_of_expiry() {
        let now = Utc::now();
        let stale = credential(now - Duration::hours(1), "rt");
        assert!(stale.is_refreshable());
        assert!(!stale.is_terminal());
    }

    #[test]
    fn test_terminal_when_expired_without_refresh_token() {
        let now = Utc::now();
        let dead = credential(now - Duration::hours(1), "");
        assert!(dead.is_terminal());

        let alive = credential(now + Duration::hours(1), "");
        assert!(!alive.is_terminal());
    }
}
