//! Single-shot local HTTP server for integration callbacks
//!
//! An integration opens a page in the user's browser; once the user finishes
//! there, the page POSTs a JSON result back to a `127.0.0.1` origin we hand
//! it up front. The server accepts exactly one callback, then shuts down so
//! the port is released before the flow continues.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex, Notify};
use tower_http::cors::CorsLayer;

/// Repository created by the deployment platform on the user's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRepo {
    /// Repository host ("github", "gitlab", ...)
    #[serde(rename = "type")]
    pub host: String,

    /// Repository location, e.g. "acme/my-project"
    pub location: String,
}

impl CallbackRepo {
    /// Clone URL for this repository
    pub fn clone_url(&self) -> String {
        format!("https://{}.com/{}", self.host, self.location)
    }
}

/// JSON body of a single integration callback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationCallback {
    /// Secret values keyed by env variable name
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,

    /// Repository descriptor, present only for the deployment flow
    #[serde(default)]
    pub repo: Option<CallbackRepo>,
}

impl IntegrationCallback {
    /// Look up a returned secret. A missing key yields an empty value:
    /// callers proceed without it rather than failing.
    pub fn env_value(&self, key: &str) -> String {
        self.env
            .as_ref()
            .and_then(|env| env.get(key))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to bind local callback server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("failed to launch integration: {0}")]
    Launch(anyhow::Error),

    #[error("no callback received within {0:?}")]
    TimedOut(Duration),

    #[error("callback channel closed before a result arrived")]
    Closed,
}

struct CallbackState {
    result: Mutex<Option<oneshot::Sender<IntegrationCallback>>>,
    shutdown: Notify,
}

/// Start an ephemeral callback server, hand its origin to `launch`, and wait
/// for the single callback.
///
/// `wait` bounds how long we sit on the open port; `None` waits indefinitely,
/// which is the behavior the interactive flow relies on (the user may take
/// minutes in the browser).
pub async fn receive_callback<F, Fut>(
    launch: F,
    wait: Option<Duration>,
) -> Result<IntegrationCallback, CallbackError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let origin = format!("http://127.0.0.1:{}", listener.local_addr()?.port());

    let (tx, rx) = oneshot::channel();
    let state = Arc::new(CallbackState {
        result: Mutex::new(Some(tx)),
        shutdown: Notify::new(),
    });

    // The browser page POSTs cross-origin, so CORS must be permissive.
    let router = Router::new()
        .route("/", post(accept_callback))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let shutdown_state = state.clone();
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown_state.shutdown.notified().await })
            .await;
    });

    if let Err(e) = launch(origin).await {
        state.shutdown.notify_one();
        let _ = server.await;
        return Err(CallbackError::Launch(e));
    }

    let received = match wait {
        Some(duration) => match tokio::time::timeout(duration, rx).await {
            Ok(received) => received,
            Err(_) => {
                state.shutdown.notify_one();
                let _ = server.await;
                return Err(CallbackError::TimedOut(duration));
            }
        },
        None => rx.await,
    };

    // Wait for the graceful shutdown so the listener is gone before we return.
    let _ = server.await;

    received.map_err(|_| CallbackError::Closed)
}

async fn accept_callback(
    State(state): State<Arc<CallbackState>>,
    Json(body): Json<IntegrationCallback>,
) -> StatusCode {
    let Some(tx) = state.result.lock().await.take() else {
        // A second callback raced in; the first one already won.
        return StatusCode::CONFLICT;
    };
    let _ = tx.send(body);
    state.shutdown.notify_one();
    StatusCode::OK
}
