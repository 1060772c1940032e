//! Retry with exponential backoff for transient failures.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, Result};

/// Caller-configured retry policy. Honored exactly: `max_attempts` bounds
/// the total number of attempts, and `base_delay` seeds the backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempt budget (first try included). Must be at least 1.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each attempt after.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or spends
/// the attempt budget.
///
/// Only rate-limit and transport failures are retried; everything else
/// returns immediately. A server-supplied `Retry-After` overrides the
/// computed delay for that iteration. The backoff sleep races the
/// cancellation token so a cancelled caller never waits out a delay.
pub async fn with_retry<F, Fut, T>(
    config: RetryConfig,
    cancel: &CancellationToken,
    label: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut backoff = config.base_delay;
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                if attempt < max_attempts {
                    let delay = e.retry_after().unwrap_or(backoff);
                    tracing::warn!(
                        request = label,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    }
                    backoff *= 2;
                }

                last_error = Some(e);
            }
        }
    }

    Err(ApiError::ExhaustedRetries {
        attempts: max_attempts,
        last: Box::new(last_error.unwrap_or(ApiError::Cancelled)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let cancel = CancellationToken::new();
        let result: Result<u32> =
            with_retry(fast_config(3), &cancel, "test", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_budget_spent_exactly() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = calls.clone();
        let result: Result<u32> = with_retry(fast_config(3), &cancel, "test", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::RateLimited { retry_after: None })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ApiError::ExhaustedRetries { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, ApiError::RateLimited { .. }));
            }
            other => panic!("expected ExhaustedRetries, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_on_second_attempt_stops_early() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = calls.clone();
        let result: Result<u32> = with_retry(fast_config(3), &cancel, "test", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ApiError::Network("reset".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_short_circuits() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = calls.clone();
        let result: Result<u32> = with_retry(fast_config(5), &cancel, "test", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Forbidden("course-1".to_string()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_backoff_doubles() {
        let cancel = CancellationToken::new();
        let config = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(40),
        };

        let start = Instant::now();
        let _: Result<u32> = with_retry(config, &cancel, "test", || async {
            Err(ApiError::Network("down".to_string()))
        })
        .await;

        // Two sleeps: 40ms + 80ms.
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_retry_after_overrides_backoff() {
        let cancel = CancellationToken::new();
        let config = RetryConfig {
            max_attempts: 2,
            base_delay: Duration::from_secs(60),
        };

        let start = Instant::now();
        let _: Result<u32> = with_retry(config, &cancel, "test", || async {
            Err(ApiError::RateLimited {
                retry_after: Some(Duration::from_millis(30)),
            })
        })
        .await;

        // Without the override this would take a minute.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancellation_mid_backoff() {
        let cancel = CancellationToken::new();
        let config = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
        };

        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            child.cancel();
        });

        let start = Instant::now();
        let result: Result<u32> = with_retry(config, &cancel, "test", || async {
            Err(ApiError::Network("down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_already_cancelled_never_calls() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<u32> = with_retry(fast_config(3), &cancel, "test", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
