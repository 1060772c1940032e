//! Configuration schema for the lectern client.
//!
//! Loaded from `config.toml` in the lectern config directory. Every field
//! has a default, so a missing file yields a usable configuration (aside
//! from the OAuth client credentials, which the user must supply).
//!
//! # Configuration
//!
//! ```toml
//! [oauth]
//! client_id = "…apps.googleusercontent.com"
//! client_secret = "…"
//! callback_port = 8080
//!
//! [api]
//! timeout_secs = 30
//! retry_max_attempts = 3
//! retry_base_delay_ms = 1000
//!
//! [cache]
//! enabled = true
//! courses_ttl_secs = 300
//! course_work_ttl_secs = 3600
//! submissions_ttl_secs = 300
//! announcements_ttl_secs = 600
//! roster_ttl_secs = 3600
//! ```
//!
//! # Environment Variables
//!
//! - `LECTERN_OAUTH_CLIENT_ID` / `LECTERN_OAUTH_CLIENT_SECRET` — override
//!   the OAuth client credentials
//! - `LECTERN_CONFIG_DIR` / `LECTERN_CACHE_DIR` — relocate state (see
//!   [`crate::paths`])

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level lectern configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LecternConfig {
    /// OAuth client settings.
    pub oauth: OAuthSettings,

    /// Remote API settings.
    pub api: ApiSettings,

    /// Response cache settings.
    pub cache: CacheSettings,
}

/// OAuth client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// OAuth client id issued by the Google Cloud console.
    ///
    /// Can be overridden by `LECTERN_OAUTH_CLIENT_ID`.
    pub client_id: String,

    /// OAuth client secret paired with the client id.
    ///
    /// Can be overridden by `LECTERN_OAUTH_CLIENT_SECRET`.
    pub client_secret: String,

    /// Authorization endpoint presenting the consent screen.
    pub authorize_url: String,

    /// Token endpoint for code exchange and refresh.
    pub token_url: String,

    /// Port of the ephemeral localhost callback listener.
    /// The redirect URI registered with the OAuth client must be
    /// `http://localhost:<callback_port>/callback`.
    pub callback_port: u16,

    /// Scopes requested at consent time.
    pub scopes: Vec<String>,

    /// How long to wait for the browser callback, in seconds.
    pub callback_timeout_secs: u64,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            callback_port: 8080,
            scopes: vec![
                "https://www.googleapis.com/auth/classroom.courses.readonly".to_string(),
                "https://www.googleapis.com/auth/classroom.coursework.students".to_string(),
                "https://www.googleapis.com/auth/classroom.rosters.readonly".to_string(),
                "https://www.googleapis.com/auth/classroom.announcements.readonly".to_string(),
                "https://www.googleapis.com/auth/classroom.profile.emails".to_string(),
            ],
            callback_timeout_secs: 300,
        }
    }
}

impl OAuthSettings {
    /// Effective client id, checking the environment variable first.
    pub fn effective_client_id(&self) -> String {
        std::env::var("LECTERN_OAUTH_CLIENT_ID").unwrap_or_else(|_| self.client_id.clone())
    }

    /// Effective client secret, checking the environment variable first.
    pub fn effective_client_secret(&self) -> String {
        std::env::var("LECTERN_OAUTH_CLIENT_SECRET").unwrap_or_else(|_| self.client_secret.clone())
    }

    /// Redirect URI derived from the callback port.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.callback_port)
    }

    /// Callback wait window as a [`Duration`].
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the Classroom REST API.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Total attempt budget for retryable failures.
    pub retry_max_attempts: u32,

    /// Initial backoff delay in milliseconds; doubles per attempt.
    pub retry_base_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://classroom.googleapis.com".to_string(),
            timeout_secs: 30,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Initial backoff delay as a [`Duration`].
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Response cache settings.
///
/// TTLs are per resource kind; the cache itself takes the duration as a
/// parameter on every store, so these are the single place kind-specific
/// staleness policy lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether reads consult the cache at all.
    pub enabled: bool,

    /// Override for the cache directory. Default: the platform cache dir.
    pub directory: Option<std::path::PathBuf>,

    /// TTL for the course list and individual courses, in seconds.
    pub courses_ttl_secs: u64,

    /// TTL for coursework, in seconds.
    pub course_work_ttl_secs: u64,

    /// TTL for student submissions, in seconds. Kept short: grades and
    /// turn-in state change underneath the client.
    pub submissions_ttl_secs: u64,

    /// TTL for announcements, in seconds.
    pub announcements_ttl_secs: u64,

    /// TTL for course rosters, in seconds.
    pub roster_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            courses_ttl_secs: 300,
            course_work_ttl_secs: 3600,
            submissions_ttl_secs: 300,
            announcements_ttl_secs: 600,
            roster_ttl_secs: 3600,
        }
    }
}

impl CacheSettings {
    /// Effective cache directory.
    pub fn effective_directory(&self) -> std::path::PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| crate::paths::cache_dir().join("responses"))
    }

    /// TTL for courses as a [`Duration`].
    pub fn courses_ttl(&self) -> Duration {
        Duration::from_secs(self.courses_ttl_secs)
    }

    /// TTL for coursework as a [`Duration`].
    pub fn course_work_ttl(&self) -> Duration {
        Duration::from_secs(self.course_work_ttl_secs)
    }

    /// TTL for submissions as a [`Duration`].
    pub fn submissions_ttl(&self) -> Duration {
        Duration::from_secs(self.submissions_ttl_secs)
    }

    /// TTL for announcements as a [`Duration`].
    pub fn announcements_ttl(&self) -> Duration {
        Duration::from_secs(self.announcements_ttl_secs)
    }

    /// TTL for rosters as a [`Duration`].
    pub fn roster_ttl(&self) -> Duration {
        Duration::from_secs(self.roster_ttl_secs)
    }
}
