use thiserror::Error;

#[derive(Debug, Error)]
pub enum BearychatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No webhook url configured")]
    NoWebhook,

    #[error("No http client configured")]
    NoHttpClient,

    /// The outgoing message failed validation or could not be serialized.
    #[error("Build failed: {0}")]
    Build(String),

    /// The request never produced an HTTP response (connect, TLS, bad url, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body (or an inbound RTM frame) is not in the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl BearychatError {
    /// Short machine-readable error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            BearychatError::Config(_) => "CONFIG_ERROR",
            BearychatError::NoWebhook => "NO_WEBHOOK",
            BearychatError::NoHttpClient => "NO_HTTP_CLIENT",
            BearychatError::Build(_) => "BUILD_ERROR",
            BearychatError::Transport(_) => "TRANSPORT_ERROR",
            BearychatError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// True for errors detected locally, before any network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BearychatError::Config(_) | BearychatError::NoWebhook | BearychatError::NoHttpClient
        )
    }
}

pub type Result<T> = std::result::Result<T, BearychatError>;
