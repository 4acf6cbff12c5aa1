//! Mock Incoming server.
//!
//! Listens on the authority of a webhook url and answers exactly that url's
//! path; every other path gets the service's 404 body.
//!
//! ```no_run
//! # async fn demo() -> Result<(), bearychat_mock::MockError> {
//! use bearychat_mock::IncomingServer;
//!
//! let server = IncomingServer::new()
//!     .with_ok_response()
//!     .with_webhook("http://127.0.0.1:0/=bwaaa/incoming/deadbeef")?
//!     .start()
//!     .await?;
//! // point a client at server.webhook_url() ...
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::MockError;

/// Application code the service uses for "resource not found".
pub const NOT_FOUND_CODE: i64 = 6;
pub const NOT_FOUND_MESSAGE: &str = "资源未找到";

/// How the server answers requests to the webhook path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Responder {
    /// 200 with an empty body.
    #[default]
    Silent,
    /// 200 `{"code": 0, "result": null}`
    Ok,
    /// 200 `{"code": 1, "result": null, "error": <message>}`
    Error(String),
}

impl Responder {
    fn respond(&self) -> Response {
        match self {
            Responder::Silent => StatusCode::OK.into_response(),
            Responder::Ok => {
                (StatusCode::OK, Json(json!({"code": 0, "result": null}))).into_response()
            }
            Responder::Error(message) => (
                StatusCode::OK,
                Json(json!({"code": 1, "result": null, "error": message})),
            )
                .into_response(),
        }
    }
}

/// Shared state handed to the axum handler.
struct MockState {
    webhook_path: String,
    responder: Responder,
    received: Arc<Mutex<Vec<Value>>>,
}

#[derive(Debug, Clone, Default)]
pub struct IncomingServer {
    webhook: Option<Url>,
    responder: Responder,
    received: Arc<Mutex<Vec<Value>>>,
}

impl IncomingServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ok_response(mut self) -> Self {
        self.responder = Responder::Ok;
        self
    }

    pub fn with_error_response(mut self, message: impl Into<String>) -> Self {
        self.responder = Responder::Error(message.into());
        self
    }

    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = responder;
        self
    }

    /// Serve `raw`'s path on `raw`'s host and port. Port 0 picks a free port
    /// at [`start`](Self::start).
    pub fn with_webhook(mut self, raw: &str) -> Result<Self, MockError> {
        let webhook = Url::parse(raw).map_err(|e| MockError::InvalidWebhook {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if webhook.host_str().is_none() {
            return Err(MockError::InvalidWebhook {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            });
        }
        self.webhook = Some(webhook);
        Ok(self)
    }

    pub fn webhook(&self) -> Option<&Url> {
        self.webhook.as_ref()
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// `host:port` the server binds to.
    pub fn addr(&self) -> Option<String> {
        self.webhook.as_ref().and_then(listen_addr)
    }

    /// JSON bodies received on the webhook path, oldest first.
    pub fn received(&self) -> Vec<Value> {
        snapshot(&self.received)
    }

    pub fn router(&self) -> Result<Router, MockError> {
        let webhook = self.webhook.as_ref().ok_or(MockError::NoWebhook)?;
        let state = Arc::new(MockState {
            webhook_path: webhook.path().to_string(),
            responder: self.responder.clone(),
            received: Arc::clone(&self.received),
        });

        Ok(Router::new()
            .fallback(serve_incoming)
            .with_state(state)
            .layer(tower_http::trace::TraceLayer::new_for_http()))
    }

    /// Bind and serve in a background task.
    pub async fn start(self) -> Result<RunningServer, MockError> {
        let (listener, router, mut webhook) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        webhook
            .set_port(Some(local_addr.port()))
            .map_err(|()| MockError::InvalidWebhook {
                url: webhook.to_string(),
                reason: "cannot carry a port".to_string(),
            })?;

        info!(addr = %local_addr, path = %webhook.path(), "mock incoming server listening");

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    // A dropped sender also counts as a stop request.
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .map_err(MockError::from)
        });

        Ok(RunningServer {
            local_addr,
            webhook,
            received: self.received,
            shutdown_tx,
            task,
        })
    }

    /// Bind and serve on the current task until `shutdown` resolves.
    pub async fn listen_and_serve<F>(self, shutdown: F) -> Result<(), MockError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (listener, router, webhook) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, path = %webhook.path(), "mock incoming server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("mock incoming server stopped");
        Ok(())
    }

    async fn bind(&self) -> Result<(TcpListener, Router, Url), MockError> {
        let webhook = self.webhook.clone().ok_or(MockError::NoWebhook)?;
        let addr = listen_addr(&webhook).ok_or_else(|| MockError::InvalidWebhook {
            url: webhook.to_string(),
            reason: "no listen address".to_string(),
        })?;
        let router = self.router()?;
        let listener = TcpListener::bind(&addr).await?;
        Ok((listener, router, webhook))
    }
}

/// Handle to a server started with [`IncomingServer::start`].
///
/// Dropping the handle without calling [`stop`](Self::stop) also shuts the
/// server down, but without waiting for it.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    webhook: Url,
    received: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), MockError>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Webhook url with the actually bound port.
    pub fn webhook_url(&self) -> String {
        self.webhook.to_string()
    }

    pub fn received(&self) -> Vec<Value> {
        snapshot(&self.received)
    }

    /// Close the listener and wait for in-flight requests to finish.
    pub async fn stop(self) -> Result<(), MockError> {
        let _ = self.shutdown_tx.send(true);
        let result = self
            .task
            .await
            .map_err(|e| MockError::Task(e.to_string()))?;
        info!(addr = %self.local_addr, "mock incoming server stopped");
        result
    }
}

async fn serve_incoming(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    body: Bytes,
) -> Response {
    if uri.path() != state.webhook_path {
        warn!(path = %uri.path(), "request to unknown webhook path");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"code": NOT_FOUND_CODE, "error": NOT_FOUND_MESSAGE, "result": null})),
        )
            .into_response();
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            if let Ok(mut received) = state.received.lock() {
                received.push(payload);
            }
        }
        Err(e) => debug!(error = %e, bytes = body.len(), "non-JSON incoming payload"),
    }

    state.responder.respond()
}

fn listen_addr(webhook: &Url) -> Option<String> {
    let host = webhook.host_str()?;
    let port = webhook.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}

fn snapshot(received: &Mutex<Vec<Value>>) -> Vec<Value> {
    received.lock().map(|r| r.clone()).unwrap_or_default()
}
