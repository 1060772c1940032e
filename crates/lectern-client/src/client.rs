//! Main client implementation.
//!
//! Read path: fingerprint → cache lookup → (miss) fresh credential →
//! authenticated, paginated, retried fetch → wire-to-domain conversion →
//! cache store → records. Mutations skip the cache and invalidate the
//! entries they make stale.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lectern_auth::Authenticator;
use lectern_cache::{CacheStats, Fingerprint, ResponseCache};

use crate::api::{AnnouncementsApi, CourseWorkApi, CoursesApi, RosterApi, SubmissionsApi};
use crate::error::{ApiError, Result};
use crate::retry::{RetryConfig, with_retry};
use crate::wire::Page;

/// Default Classroom API base URL.
const DEFAULT_BASE_URL: &str = "https://classroom.googleapis.com";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Cache TTL per resource kind. The cache itself is TTL-agnostic; this is
/// where kind-specific staleness policy lives.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub courses: Duration,
    pub course_work: Duration,
    pub submissions: Duration,
    pub announcements: Duration,
    pub roster: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            courses: Duration::from_secs(300),
            course_work: Duration::from_secs(3600),
            submissions: Duration::from_secs(300),
            announcements: Duration::from_secs(600),
            roster: Duration::from_secs(3600),
        }
    }
}

/// Configuration for the Classroom client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Retry policy for rate-limit and transport failures.
    pub retry: RetryConfig,

    /// Per-kind cache TTLs.
    pub ttls: CacheTtls,

    /// Whether reads consult and populate the cache.
    pub cache_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
            ttls: CacheTtls::default(),
            cache_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-kind cache TTLs.
    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    /// Enable or disable the response cache.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The cacheable resource kinds, each with its own fingerprint namespace
/// and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Courses,
    CourseWork,
    Submissions,
    Announcements,
    Roster,
}

impl ResourceKind {
    /// Fingerprint namespace for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Courses => "courses",
            ResourceKind::CourseWork => "course_work",
            ResourceKind::Submissions => "submissions",
            ResourceKind::Announcements => "announcements",
            ResourceKind::Roster => "roster",
        }
    }

    fn ttl(self, ttls: &CacheTtls) -> Duration {
        match self {
            ResourceKind::Courses => ttls.courses,
            ResourceKind::CourseWork => ttls.course_work,
            ResourceKind::Submissions => ttls.submissions,
            ResourceKind::Announcements => ttls.announcements,
            ResourceKind::Roster => ttls.roster,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Google Classroom API client.
///
/// Explicitly constructed from its collaborators so tests can wire
/// isolated instances against temporary storage and mock servers.
/// Cheap to clone; clones share the connection pool, cache, and
/// authenticator.
#[derive(Clone)]
pub struct ClassroomClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    auth: Arc<Authenticator>,
    cache: ResponseCache,
    config: ClientConfig,
}

impl ClassroomClient {
    /// Create a client from its parts.
    pub fn new(
        config: ClientConfig,
        auth: Arc<Authenticator>,
        cache: ResponseCache,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                auth,
                cache,
                config,
            }),
        })
    }

    /// The authenticator backing this client.
    pub fn auth(&self) -> &Arc<Authenticator> {
        &self.inner.auth
    }

    // ─────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Access the courses API.
    pub fn courses(&self) -> CoursesApi {
        CoursesApi::new(self.clone())
    }

    /// Access the coursework API.
    pub fn course_work(&self) -> CourseWorkApi {
        CourseWorkApi::new(self.clone())
    }

    /// Access the student-submissions API.
    pub fn submissions(&self) -> SubmissionsApi {
        SubmissionsApi::new(self.clone())
    }

    /// Access the announcements API.
    pub fn announcements(&self) -> AnnouncementsApi {
        AnnouncementsApi::new(self.clone())
    }

    /// Access the roster API.
    pub fn roster(&self) -> RosterApi {
        RosterApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cache passthroughs
    // ─────────────────────────────────────────────────────────────────────

    /// Census of the response cache.
    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats().await
    }

    /// Drop every cached response.
    pub async fn cache_clear(&self) -> Result<()> {
        Ok(self.inner.cache.clear().await?)
    }

    /// Drop the cached collection for one resource so the next read
    /// refetches (the TUI's refresh key).
    pub async fn cache_invalidate(&self, kind: ResourceKind, path_ids: &[&str]) -> Result<()> {
        let fingerprint = Fingerprint::new(kind.as_str(), path_ids, &[]);
        Ok(self.inner.cache.invalidate(&fingerprint).await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Core request path
    // ─────────────────────────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.inner.config.base_url.trim_end_matches('/'),
            path
        )
    }

    /// One authenticated request attempt. Retry policy lives in the
    /// callers; this maps a single exchange to a typed outcome.
    async fn attempt<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        page_token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let credential = self.inner.auth.ensure_fresh(cancel).await?;

        let mut request = self
            .inner
            .http
            .request(method.clone(), self.endpoint(path))
            .bearer_auth(&credential.access_token);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        if method == Method::POST {
            request = request.json(&serde_json::json!({}));
        }

        let response = tokio::select! {
            result = request.send() => result.map_err(ApiError::from)?,
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(self.error_from_response(status, response).await);
        }

        let body = response.text().await.map_err(ApiError::from)?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{} response: {}", path, e)))
    }

    /// Map a non-success response to the error taxonomy.
    async fn error_from_response(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> ApiError {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body, status);

        match status.as_u16() {
            401 => {
                // Never hand the same known-bad bearer token to a later
                // call; the next read goes through login instead.
                self.inner.auth.invalidate().await;
                ApiError::AuthRequired
            }
            // The quota backend reports rate limiting as 403 with a
            // RESOURCE_EXHAUSTED status rather than a 429.
            403 if message.contains("RESOURCE_EXHAUSTED")
                || message.contains("rateLimitExceeded") =>
            {
                ApiError::RateLimited { retry_after }
            }
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited { retry_after },
            400 => ApiError::InvalidRequest(message),
            500..=599 => ApiError::ServerError {
                status: status.as_u16(),
                message,
            },
            _ => ApiError::InvalidRequest(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Fetch every page of a collection, in page order.
    async fn list_all<P: Page>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: P = with_retry(self.inner.config.retry, cancel, path, || {
                self.attempt(Method::GET, path, page_token.as_deref(), cancel)
            })
            .await?;

            let (batch, next) = page.into_parts();
            items.extend(batch);

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    /// Cache-first collection read: the assembled, converted collection is
    /// stored under one fingerprint, not per page.
    pub(crate) async fn cached_list<P, T>(
        &self,
        kind: ResourceKind,
        path: &str,
        path_ids: &[&str],
        cancel: &CancellationToken,
    ) -> Result<Vec<T>>
    where
        P: Page,
        T: TryFrom<P::Item, Error = ApiError> + Serialize + DeserializeOwned,
    {
        let fingerprint = Fingerprint::new(kind.as_str(), path_ids, &[]);

        if let Some(payload) = self.cache_lookup(&fingerprint).await {
            match serde_json::from_value::<Vec<T>>(payload) {
                Ok(records) => return Ok(records),
                Err(e) => {
                    // Entry written by an older schema; refetch instead of
                    // failing the read.
                    warn!(fingerprint = %fingerprint, error = %e, "Discarding undecodable cache entry");
                    let _ = self.inner.cache.invalidate(&fingerprint).await;
                }
            }
        }

        let wire_items = self.list_all::<P>(path, cancel).await?;
        let records: Vec<T> = wire_items
            .into_iter()
            .map(T::try_from)
            .collect::<Result<_>>()?;

        self.cache_store(kind, &fingerprint, &records).await;
        Ok(records)
    }

    /// Cache-first single-record read.
    pub(crate) async fn cached_get<W, T>(
        &self,
        kind: ResourceKind,
        path: &str,
        path_ids: &[&str],
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        W: DeserializeOwned,
        T: TryFrom<W, Error = ApiError> + Serialize + DeserializeOwned,
    {
        let fingerprint = Fingerprint::new(kind.as_str(), path_ids, &[]);

        if let Some(payload) = self.cache_lookup(&fingerprint).await {
            match serde_json::from_value::<T>(payload) {
                Ok(record) => return Ok(record),
                Err(e) => {
                    warn!(fingerprint = %fingerprint, error = %e, "Discarding undecodable cache entry");
                    let _ = self.inner.cache.invalidate(&fingerprint).await;
                }
            }
        }

        let wire: W = with_retry(self.inner.config.retry, cancel, path, || {
            self.attempt(Method::GET, path, None, cancel)
        })
        .await?;
        let record = T::try_from(wire)?;

        self.cache_store(kind, &fingerprint, &record).await;
        Ok(record)
    }

    /// Live mutation: never cached, always forwarded.
    pub(crate) async fn mutate(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        let _: serde_json::Value = with_retry(self.inner.config.retry, cancel, path, || {
            self.attempt(Method::POST, path, None, cancel)
        })
        .await?;
        Ok(())
    }

    async fn cache_lookup(&self, fingerprint: &Fingerprint) -> Option<serde_json::Value> {
        if !self.inner.config.cache_enabled {
            return None;
        }
        self.inner.cache.lookup(fingerprint).await
    }

    /// Store a fetched result. A cache write failure is logged, not
    /// surfaced: the fetch itself succeeded and the caller gets its data.
    async fn cache_store<T: Serialize>(
        &self,
        kind: ResourceKind,
        fingerprint: &Fingerprint,
        records: &T,
    ) {
        if !self.inner.config.cache_enabled {
            return;
        }
        let payload = match serde_json::to_value(records) {
            Ok(value) => value,
            Err(e) => {
                warn!(fingerprint = %fingerprint, error = %e, "Failed to serialize records for cache");
                return;
            }
        };
        let ttl = kind.ttl(&self.inner.config.ttls);
        if let Err(e) = self.inner.cache.store(fingerprint, payload, ttl).await {
            warn!(fingerprint = %fingerprint, error = %e, "Failed to store cache entry");
        } else {
            debug!(fingerprint = %fingerprint, ttl_secs = ttl.as_secs(), "Cached response");
        }
    }
}

/// Parse a `Retry-After` header value in seconds form.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull the human-readable message out of a Classroom error body.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        message: String,
        #[serde(default)]
        status: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            if parsed.error.status.is_empty() {
                parsed.error.message
            } else {
                format!("{} ({})", parsed.error.message, parsed.error.status)
            }
        }
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Course, Submission};
    use chrono::{Duration as ChronoDuration, Utc};
    use lectern_auth::{Credential, MemoryTokenStore, OAuthConfig, SharedTokenStore};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn retry_fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(10),
        }
    }

    async fn test_client(server: &MockServer, cache_dir: &std::path::Path) -> ClassroomClient {
        test_client_with_retry(server, cache_dir, retry_fast(3)).await
    }

    async fn test_client_with_retry(
        server: &MockServer,
        cache_dir: &std::path::Path,
        retry: RetryConfig,
    ) -> ClassroomClient {
        let credential = Credential {
            access_token: "test-bearer".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
            scopes: vec![],
        };
        let store: SharedTokenStore = Arc::new(MemoryTokenStore::with_credential(credential));
        let auth = Arc::new(Authenticator::new(
            OAuthConfig {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                authorize_url: "https://example.com/auth".to_string(),
                token_url: format!("{}/token", server.uri()),
                redirect_uri: "http://localhost:8080/callback".to_string(),
                scopes: vec![],
            },
            store,
            8080,
            Duration::from_secs(1),
        ));

        let cache = ResponseCache::open(cache_dir).await.unwrap();
        let config = ClientConfig::default()
            .with_base_url(server.uri())
            .with_retry(retry);
        ClassroomClient::new(config, auth, cache).unwrap()
    }

    fn course_page(ids: &[&str], next: Option<&str>) -> serde_json::Value {
        let courses: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({"id": id, "name": format!("Course {}", id)}))
            .collect();
        match next {
            Some(token) => serde_json::json!({"courses": courses, "nextPageToken": token}),
            None => serde_json::json!({"courses": courses}),
        }
    }

    #[tokio::test]
    async fn test_pagination_assembles_pages_in_order() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .and(query_param("pageToken", "p2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(course_page(&["c3", "c4"], Some("p3"))),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .and(query_param("pageToken", "p3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(course_page(&["c5"], None)))
            .mount(&server)
            .await;
        // No pageToken: the first page. Mounted last so the token matchers
        // above take precedence.
        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(course_page(&["c1", "c2"], Some("p2"))),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();
        let courses: Vec<Course> = client.courses().list(&cancel).await.unwrap();

        let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .and(header("authorization", "Bearer test-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(course_page(&["c1"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();

        let first = client.courses().list(&cancel).await.unwrap();
        let second = client.courses().list(&cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_spent_exactly() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client_with_retry(&server, temp.path(), retry_fast(3)).await;
        let cancel = CancellationToken::new();
        let result = client.courses().list(&cancel).await;

        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        match result {
            Err(ApiError::ExhaustedRetries { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, ApiError::RateLimited { .. }));
            }
            other => panic!("expected ExhaustedRetries, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_after_rate_limit_stops_retrying() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(course_page(&["c1"], None)))
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();
        let courses: Vec<Course> = client.courses().list(&cancel).await.unwrap();

        assert_eq!(courses.len(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_forbidden_and_not_found_short_circuit() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses/locked"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"message": "The caller does not have permission", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/courses/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"message": "Course not found", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();

        let forbidden = client.courses().get("locked", &cancel).await;
        assert!(matches!(forbidden, Err(ApiError::Forbidden(_))));

        let missing = client.courses().get("ghost", &cancel).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        // One request each: no retries for either class.
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_quota_403_is_rate_limited() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let client = test_client_with_retry(&server, temp.path(), retry_fast(2)).await;
        let cancel = CancellationToken::new();
        let result = client.courses().list(&cancel).await;

        // Treated as retryable rate limiting, not a permission failure.
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
        assert!(matches!(result, Err(ApiError::ExhaustedRetries { .. })));
    }

    #[tokio::test]
    async fn test_unauthorized_invalidates_credential() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();
        let result = client.courses().list(&cancel).await;

        assert!(matches!(result, Err(ApiError::AuthRequired)));
        // The known-bad credential is gone.
        assert!(!client.auth().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_server_error_is_typed() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();
        let result = client.courses().list(&cancel).await;

        assert!(matches!(
            result,
            Err(ApiError::ServerError { status: 503, .. })
        ));
        // 5xx is not retried.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_turn_in_invalidates_submissions_cache() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses/c1/courseWork/w1/studentSubmissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "studentSubmissions": [
                    {"id": "s1", "courseId": "c1", "courseWorkId": "w1", "state": "NEW"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/courses/c1/courseWork/w1/studentSubmissions/s1:turnIn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();

        let _: Vec<Submission> = client.submissions().list("c1", "w1", &cancel).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        client
            .submissions()
            .turn_in("c1", "w1", "s1", &cancel)
            .await
            .unwrap();

        // The cached collection was invalidated; the next list refetches.
        let _: Vec<Submission> = client.submissions().list("c1", "w1", &cancel).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cancellation_mid_backoff() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client_with_retry(
            &server,
            temp.path(),
            RetryConfig {
                max_attempts: 3,
                base_delay: Duration::from_secs(60),
            },
        )
        .await;

        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            child.cancel();
        });

        let start = std::time::Instant::now();
        let result = client.courses().list(&cancel).await;

        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cache_disabled_always_fetches() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(course_page(&["c1"], None)))
            .mount(&server)
            .await;

        let credential = Credential {
            access_token: "test-bearer".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
            scopes: vec![],
        };
        let store: SharedTokenStore = Arc::new(MemoryTokenStore::with_credential(credential));
        let auth = Arc::new(Authenticator::new(
            OAuthConfig {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                authorize_url: "https://example.com/auth".to_string(),
                token_url: format!("{}/token", server.uri()),
                redirect_uri: "http://localhost:8080/callback".to_string(),
                scopes: vec![],
            },
            store,
            8080,
            Duration::from_secs(1),
        ));
        let cache = ResponseCache::open(temp.path()).await.unwrap();
        let config = ClientConfig::default()
            .with_base_url(server.uri())
            .with_retry(retry_fast(3))
            .with_cache_enabled(false);
        let client = ClassroomClient::new(config, auth, cache).unwrap();

        let cancel = CancellationToken::new();
        client.courses().list(&cancel).await.unwrap();
        client.courses().list(&cancel).await.unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_record_is_decode_error() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "courses": [{"name": "id went missing"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, temp.path()).await;
        let cancel = CancellationToken::new();
        let result = client.courses().list(&cancel).await;

        assert!(matches!(result, Err(ApiError::Decode(_))));
        // Nothing malformed was cached.
        assert_eq!(client.cache_stats().await.total, 0);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 10 "), Some(Duration::from_secs(10)));
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"message": "Course not found", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            extract_error_message(body, StatusCode::NOT_FOUND),
            "Course not found (NOT_FOUND)"
        );
        assert_eq!(
            extract_error_message("not json", StatusCode::NOT_FOUND),
            "Not Found"
        );
    }
}
