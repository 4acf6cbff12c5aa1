//! Outgoing "Incoming" messages pushed into BearyChat through a webhook.
//!
//! Wire: `{ "text": "...", "channel": "...", "markdown": true, "attachments": [...] }`
//! Unset optional fields are left out of the payload entirely.

use serde::{Deserialize, Serialize};

use crate::error::{BearychatError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incoming {
    pub text: String,
    /// Text shown in push notifications instead of `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub markdown: bool,
    /// Target channel name; the webhook's default channel is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Target user for a direct message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<IncomingAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Hex color of the attachment bar, e.g. `#ffa500`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<IncomingAttachmentImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingAttachmentImage {
    pub url: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Incoming {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn with_notification(mut self, notification: impl Into<String>) -> Self {
        self.notification = Some(notification.into());
        self
    }

    pub fn with_attachment(mut self, attachment: IncomingAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Check the message against the rules the Incoming endpoint enforces.
    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(BearychatError::Build("text is required".to_string()));
        }
        for (i, attachment) in self.attachments.iter().enumerate() {
            attachment
                .validate()
                .map_err(|reason| BearychatError::Build(format!("attachment {i}: {reason}")))?;
        }
        Ok(())
    }

    /// Validate and serialize into the JSON request body.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.validate()?;
        serde_json::to_vec(self).map_err(|e| BearychatError::Build(e.to_string()))
    }
}

impl IncomingAttachment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(IncomingAttachmentImage { url: url.into() });
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let has = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
        if !has(&self.title) && !has(&self.text) {
            return Err("title or text is required".to_string());
        }
        if let Some(color) = &self.color {
            if !is_hex_color(color) {
                return Err(format!("invalid color {color:?}"));
            }
        }
        if self.images.iter().any(|image| image.url.is_empty()) {
            return Err("image url is required".to_string());
        }
        Ok(())
    }
}

/// `#rgb` or `#rrggbb`.
fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
