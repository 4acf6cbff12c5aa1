use thiserror::Error;

/// Errors produced by the mock Incoming server.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("No webhook configured")]
    NoWebhook,

    #[error("Invalid webhook url {url}: {reason}")]
    InvalidWebhook { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(String),
}

impl MockError {
    pub fn code(&self) -> &'static str {
        match self {
            MockError::NoWebhook => "NO_WEBHOOK",
            MockError::InvalidWebhook { .. } => "INVALID_WEBHOOK",
            MockError::Io(_) => "IO_ERROR",
            MockError::Task(_) => "TASK_ERROR",
        }
    }
}
