//! CLI command implementations.

pub mod cache;
pub mod courses;
pub mod login;
pub mod logout;
pub mod status;
pub mod tui;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use lectern_auth::{Authenticator, FileTokenStore, OAuthConfig, SharedTokenStore};
use lectern_cache::ResponseCache;
use lectern_client::{CacheTtls, ClassroomClient, ClientConfig, RetryConfig};
use lectern_config::LecternConfig;

/// Shared context for commands.
pub struct Context {
    pub config: LecternConfig,
    pub json_output: bool,
}

impl Context {
    /// Wire up an authenticator against the file-backed credential store.
    pub fn authenticator(&self) -> Arc<Authenticator> {
        let oauth = &self.config.oauth;
        let store: SharedTokenStore =
            Arc::new(FileTokenStore::new(&lectern_config::paths::config_dir()));
        Arc::new(Authenticator::new(
            OAuthConfig {
                client_id: oauth.effective_client_id(),
                client_secret: oauth.effective_client_secret(),
                authorize_url: oauth.authorize_url.clone(),
                token_url: oauth.token_url.clone(),
                redirect_uri: oauth.redirect_uri(),
                scopes: oauth.scopes.clone(),
            },
            store,
            oauth.callback_port,
            oauth.callback_timeout(),
        ))
    }

    /// Wire up the full data-access stack: authenticator, response cache,
    /// and API client.
    pub async fn client(&self) -> Result<ClassroomClient> {
        let cache_dir = self.config.cache.effective_directory();
        let cache = ResponseCache::open(&cache_dir)
            .await
            .with_context(|| format!("opening response cache at {}", cache_dir.display()))?;

        let client_config = ClientConfig::default()
            .with_base_url(self.config.api.base_url.clone())
            .with_timeout(self.config.api.timeout())
            .with_retry(RetryConfig {
                max_attempts: self.config.api.retry_max_attempts,
                base_delay: self.config.api.retry_base_delay(),
            })
            .with_ttls(CacheTtls {
                courses: self.config.cache.courses_ttl(),
                course_work: self.config.cache.course_work_ttl(),
                submissions: self.config.cache.submissions_ttl(),
                announcements: self.config.cache.announcements_ttl(),
                roster: self.config.cache.roster_ttl(),
            })
            .with_cache_enabled(self.config.cache.enabled);

        ClassroomClient::new(client_config, self.authenticator(), cache)
            .context("building API client")
    }
}
