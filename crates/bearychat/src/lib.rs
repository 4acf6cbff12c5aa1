//! BearyChat client SDK.
//!
//! ```no_run
//! # async fn demo() -> bearychat::Result<()> {
//! use bearychat::{Incoming, IncomingWebhookClient};
//!
//! let payload = Incoming::new("Hello, BearyChat").build()?;
//! let resp = IncomingWebhookClient::new("YOUR WEBHOOK URL").send(payload).await?;
//! if resp.is_ok() {
//!     // inspect resp.result
//! } else {
//!     // inspect resp.error
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod incoming;
pub mod rtm;
pub mod types;
pub mod webhook;

pub use config::{BearychatConfig, IncomingConfig, MockConfig};
pub use error::{BearychatError, Result};
pub use incoming::{Incoming, IncomingAttachment, IncomingAttachmentImage};
pub use rtm::{RtmMessage, RtmMessageType};
pub use types::User;
pub use webhook::{IncomingWebhookClient, WebhookResponse};
