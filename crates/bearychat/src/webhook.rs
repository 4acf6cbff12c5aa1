//! Incoming webhook client.
//!
//! A send is one request/response exchange: no retries, no timeout beyond the
//! transport's own. Transport and decode problems come back as `Err`; an
//! application failure (`code != 0`) is an `Ok` response the caller inspects
//! with [`WebhookResponse::is_ok`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::IncomingConfig;
use crate::error::{BearychatError, Result};
use crate::incoming::Incoming;

/// Wire: `{ "code": 0, "result": null }` or `{ "code": 1, "result": null, "error": "..." }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl WebhookResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Pushes payloads to a single Incoming webhook.
///
/// The client only holds configuration, so a shared `&IncomingWebhookClient`
/// can send from several tasks at once.
#[derive(Debug, Clone)]
pub struct IncomingWebhookClient {
    webhook: String,
    http_client: Option<reqwest::Client>,
}

impl IncomingWebhookClient {
    /// Create a client for `webhook` (may be empty) with its own default transport.
    pub fn new(webhook: impl Into<String>) -> Self {
        Self {
            webhook: webhook.into(),
            http_client: Some(reqwest::Client::new()),
        }
    }

    pub fn from_config(config: &IncomingConfig) -> Self {
        Self::new(config.webhook.clone().unwrap_or_default())
    }

    pub fn webhook(&self) -> &str {
        &self.webhook
    }

    pub fn http_client(&self) -> Option<&reqwest::Client> {
        self.http_client.as_ref()
    }

    /// Replace the target url. Not validated until [`send`](Self::send).
    pub fn set_webhook(&mut self, webhook: impl Into<String>) -> &mut Self {
        self.webhook = webhook.into();
        self
    }

    /// Replace the transport. `None` makes every send fail with `NoHttpClient`.
    pub fn set_http_client(&mut self, http_client: Option<reqwest::Client>) -> &mut Self {
        self.http_client = http_client;
        self
    }

    /// Both a webhook url and a transport are present.
    pub fn is_ready(&self) -> bool {
        !self.webhook.is_empty() && self.http_client.is_some()
    }

    /// POST `payload` (a built Incoming body) and decode the endpoint's answer.
    ///
    /// The HTTP status is not consulted: every completed response is decoded.
    pub async fn send(&self, payload: Vec<u8>) -> Result<WebhookResponse> {
        if self.webhook.is_empty() {
            return Err(BearychatError::NoWebhook);
        }
        let http_client = self.http_client.as_ref().ok_or(BearychatError::NoHttpClient)?;

        debug!(webhook = %self.webhook, bytes = payload.len(), "sending incoming payload");

        let resp = http_client
            .post(&self.webhook)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(webhook = %self.webhook, error = %e, "incoming webhook request failed");
                BearychatError::Transport(e)
            })?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await?;

        let decoded: WebhookResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!(status, body = %String::from_utf8_lossy(&body), "undecodable webhook response");
            BearychatError::Decode(e)
        })?;

        debug!(status, code = decoded.code, "incoming webhook answered");
        Ok(decoded)
    }

    /// Build `incoming` and send it.
    pub async fn send_incoming(&self, incoming: &Incoming) -> Result<WebhookResponse> {
        self.send(incoming.build()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_WEBHOOK: &str = "http://127.0.0.1:3927/=bwaaa/incoming/deadbeef";

    #[test]
    fn response_ok_iff_code_zero() {
        assert!(WebhookResponse { code: 0, ..Default::default() }.is_ok());
        assert!(!WebhookResponse { code: 1, ..Default::default() }.is_ok());
    }

    #[test]
    fn response_decodes_error_shape() {
        let json = r#"{"code": 1, "result": null, "error": "foobar"}"#;
        let resp: WebhookResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.error.as_deref(), Some("foobar"));
        assert!(resp.result.is_none());
    }

    #[test]
    fn response_without_code_is_rejected() {
        assert!(serde_json::from_str::<WebhookResponse>(r#"{"result": null}"#).is_err());
    }

    #[test]
    fn set_webhook_chains_and_sets() {
        let mut client = IncomingWebhookClient::new("");
        assert!(!client.is_ready());
        assert_eq!(client.set_webhook(TEST_WEBHOOK).webhook(), TEST_WEBHOOK);
        assert!(client.is_ready());
    }

    #[test]
    fn default_transport_present_and_replaceable() {
        let mut client = IncomingWebhookClient::new(TEST_WEBHOOK);
        assert!(client.http_client().is_some());

        client
            .set_http_client(None)
            .set_webhook(TEST_WEBHOOK);
        assert!(client.http_client().is_none());
        assert!(!client.is_ready());

        client.set_http_client(Some(reqwest::Client::new()));
        assert!(client.is_ready());
    }

    #[test]
    fn from_config_uses_webhook() {
        let config = IncomingConfig {
            webhook: Some(TEST_WEBHOOK.to_string()),
            ..Default::default()
        };
        assert_eq!(IncomingWebhookClient::from_config(&config).webhook(), TEST_WEBHOOK);
        assert!(!IncomingWebhookClient::from_config(&IncomingConfig::default()).is_ready());
    }

    #[tokio::test]
    async fn send_without_webhook_fails() {
        let err = IncomingWebhookClient::new("").send(Vec::new()).await.unwrap_err();
        assert!(matches!(err, BearychatError::NoWebhook));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn send_without_http_client_fails() {
        let mut client = IncomingWebhookClient::new(TEST_WEBHOOK);
        client.set_http_client(None);
        let err = client.send(Vec::new()).await.unwrap_err();
        assert!(matches!(err, BearychatError::NoHttpClient));
    }

    #[tokio::test]
    async fn send_to_malformed_url_is_transport_error() {
        let err = IncomingWebhookClient::new("not a url")
            .send(b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, BearychatError::Transport(_)));
    }

    #[tokio::test]
    async fn send_incoming_reports_build_error_first() {
        let err = IncomingWebhookClient::new(TEST_WEBHOOK)
            .send_incoming(&Incoming::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BearychatError::Build(_)));
    }
}
