//! Ephemeral localhost listener for the OAuth redirect.
//!
//! Bound for the duration of a single login attempt, accepts exactly one
//! callback, and is torn down regardless of outcome. A callback whose state
//! token does not match the one issued for the attempt is rejected and the
//! login fails closed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::{AuthError, Result};

const SUCCESS_PAGE: &str = "<html><body><h1>Signed in</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h1>Sign-in failed</h1>\
    <p>Return to the terminal for details.</p></body></html>";

struct CallbackState {
    expected_state: String,
    // Consumed by the first callback; later requests find it empty.
    sender: Mutex<Option<oneshot::Sender<Result<String>>>>,
}

/// Wait for the authorization callback on `127.0.0.1:<port>/callback`.
///
/// Resolves with the authorization code, or with `StateMismatch`,
/// `ConsentDenied`, `TimedOut`, or `Cancelled`. The listener is shut down
/// before this function returns on every path.
pub async fn await_callback(
    port: u16,
    expected_state: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String> {
    let (tx, rx) = oneshot::channel();
    let state = Arc::new(CallbackState {
        expected_state: expected_state.to_string(),
        sender: Mutex::new(Some(tx)),
    });

    let router = Router::new()
        .route("/callback", get(handle_callback))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AuthError::Listener(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::debug!(addr = %addr, "Callback listener started");

    let shutdown = CancellationToken::new();
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .ok();
        }
    });

    let outcome = tokio::select! {
        received = rx => match received {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::Listener("Callback channel closed".to_string())),
        },
        _ = tokio::time::sleep(timeout) => Err(AuthError::TimedOut),
        _ = cancel.cancelled() => Err(AuthError::Cancelled),
    };

    shutdown.cancel();
    server.await.ok();
    tracing::debug!("Callback listener stopped");

    outcome
}

async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let Some(sender) = state.sender.lock().await.take() else {
        return (StatusCode::GONE, Html(FAILURE_PAGE));
    };

    if let Some(error) = params.get("error") {
        let _ = sender.send(Err(AuthError::ConsentDenied(error.clone())));
        return (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE));
    }

    if params.get("state").map(String::as_str) != Some(state.expected_state.as_str()) {
        tracing::warn!("Callback rejected: state token mismatch");
        let _ = sender.send(Err(AuthError::StateMismatch));
        return (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE));
    }

    match params.get("code") {
        Some(code) if !code.is_empty() => {
            let _ = sender.send(Ok(code.clone()));
            (StatusCode::OK, Html(SUCCESS_PAGE))
        }
        _ => {
            let _ = sender.send(Err(AuthError::ConsentDenied(
                "callback carried no authorization code".to_string(),
            )));
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hit(port: u16, query: &str) -> reqwest::Response {
        reqwest::get(format!("http://127.0.0.1:{}/callback?{}", port, query))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_matching_callback() {
        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            await_callback(18711, "good-state", Duration::from_secs(5), &cancel).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let response = hit(18711, "state=good-state&code=the-code").await;
        assert_eq!(response.status(), 200);

        let code = wait.await.unwrap().unwrap();
        assert_eq!(code, "the-code");
    }

    #[tokio::test]
    async fn test_rejects_state_mismatch() {
        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            await_callback(18712, "good-state", Duration::from_secs(5), &cancel).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let response = hit(18712, "state=forged&code=stolen").await;
        assert_eq!(response.status(), 400);

        let result = wait.await.unwrap();
        assert!(matches!(result, Err(AuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_consent_denied() {
        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            await_callback(18713, "good-state", Duration::from_secs(5), &cancel).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        hit(18713, "error=access_denied").await;

        let result = wait.await.unwrap();
        assert!(matches!(result, Err(AuthError::ConsentDenied(_))));
    }

    #[tokio::test]
    async fn test_times_out_without_callback() {
        let cancel = CancellationToken::new();
        let result =
            await_callback(18714, "state", Duration::from_millis(100), &cancel).await;
        assert!(matches!(result, Err(AuthError::TimedOut)));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_wait() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            child.cancel();
        });

        let result = await_callback(18715, "state", Duration::from_secs(30), &cancel).await;
        assert!(matches!(result, Err(AuthError::Cancelled)));
    }

    #[tokio::test]
    async fn test_listener_torn_down_after_outcome() {
        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            await_callback(18716, "s", Duration::from_secs(5), &cancel).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        hit(18716, "state=s&code=c").await;
        wait.await.unwrap().unwrap();

        // The port is released once the attempt completes.
        let err = reqwest::get("http://127.0.0.1:18716/callback?state=s&code=c").await;
        assert!(err.is_err());
    }
}
