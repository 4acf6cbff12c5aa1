//! Real-time messaging (RTM) frames.
//!
//! The RTM wire protocol is loosely typed: each message type carries its own
//! set of fields. [`RtmMessage`] therefore keeps the raw JSON object and
//! exposes typed accessors on top of it. A missing key always reads as the
//! zero value (`null` / `""`), never as an error.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{BearychatError, Result};
use crate::types::User;

/// Mentions are embedded in message text as `@<=UID=>`.
const MENTION_OPEN: &str = "@<=";
const MENTION_CLOSE: &str = "=>";

static NULL: Value = Value::Null;

/// Tag carried in the `type` field of every RTM frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RtmMessageType {
    #[default]
    Unknown,
    Ping,
    Pong,
    Reply,
    Ok,
    P2pMessage,
    P2pTyping,
    ChannelMessage,
    ChannelTyping,
    UpdateUserConnection,
}

impl RtmMessageType {
    pub const ALL: [RtmMessageType; 10] = [
        RtmMessageType::Unknown,
        RtmMessageType::Ping,
        RtmMessageType::Pong,
        RtmMessageType::Reply,
        RtmMessageType::Ok,
        RtmMessageType::P2pMessage,
        RtmMessageType::P2pTyping,
        RtmMessageType::ChannelMessage,
        RtmMessageType::ChannelTyping,
        RtmMessageType::UpdateUserConnection,
    ];

    /// Wire tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            RtmMessageType::Unknown => "unknown",
            RtmMessageType::Ping => "ping",
            RtmMessageType::Pong => "pong",
            RtmMessageType::Reply => "reply",
            RtmMessageType::Ok => "ok",
            RtmMessageType::P2pMessage => "message",
            RtmMessageType::P2pTyping => "typing",
            RtmMessageType::ChannelMessage => "channel_message",
            RtmMessageType::ChannelTyping => "channel_typing",
            RtmMessageType::UpdateUserConnection => "update_user_connection",
        }
    }

    /// Parse a wire tag. Tags this SDK does not know map to `Unknown`.
    pub fn from_wire(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .unwrap_or_default()
    }

    pub fn is_p2p(self) -> bool {
        matches!(
            self,
            RtmMessageType::P2pMessage | RtmMessageType::P2pTyping
        )
    }

    pub fn is_chat_message(self) -> bool {
        matches!(
            self,
            RtmMessageType::P2pMessage | RtmMessageType::ChannelMessage
        )
    }
}

impl fmt::Display for RtmMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RtmMessageType> for Value {
    fn from(t: RtmMessageType) -> Self {
        Value::String(t.as_str().to_string())
    }
}

impl Serialize for RtmMessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RtmMessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&tag))
    }
}

/// One RTM frame, kept as the JSON object it arrived as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RtmMessage(Map<String, Value>);

impl RtmMessage {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Decode a single wire frame. Anything other than a JSON object is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(BearychatError::Decode)
    }

    /// Keep-alive frame sent by the client; the server answers with `pong`.
    pub fn ping(call_id: u64) -> Self {
        Self::new()
            .with("type", RtmMessageType::Ping)
            .with("call_id", call_id)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of `key`, or `""` when absent or not a string.
    pub fn get_str(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn message_type(&self) -> RtmMessageType {
        self.0
            .get("type")
            .and_then(Value::as_str)
            .map(RtmMessageType::from_wire)
            .unwrap_or_default()
    }

    pub fn is_p2p(&self) -> bool {
        self.message_type().is_p2p()
    }

    pub fn is_chat_message(&self) -> bool {
        self.message_type().is_chat_message()
    }

    pub fn text(&self) -> &str {
        self.get_str("text")
    }

    pub fn key(&self) -> &str {
        self.get_str("key")
    }

    /// True when the sender `uid` is exactly `user.id`. A frame without a
    /// `uid` is never from anyone.
    pub fn is_from_me(&self, user: &User) -> bool {
        matches!(self.0.get("uid"), Some(Value::String(uid)) if *uid == user.id)
    }

    /// User ids mentioned in `text`, in order of appearance.
    pub fn mentioned_uids(&self) -> Vec<&str> {
        let mut uids = Vec::new();
        let mut rest = self.text();
        while let Some(start) = rest.find(MENTION_OPEN) {
            let after = &rest[start + MENTION_OPEN.len()..];
            let Some(end) = after.find(MENTION_CLOSE) else {
                break;
            };
            if end > 0 {
                uids.push(&after[..end]);
            }
            rest = &after[end + MENTION_CLOSE.len()..];
        }
        uids
    }

    pub fn is_mention_user(&self, user: &User) -> bool {
        self.mentioned_uids().contains(&user.id.as_str())
    }

    /// Build a message that quotes this one (`refer_key` = our `key`) and is
    /// addressed to the same conversation.
    pub fn refer(&self, text: &str) -> RtmMessage {
        let mut refer = self.derive(text);
        refer.copy_from(self, "key", "refer_key");
        refer
    }

    /// Build a message addressed to the same conversation, without quoting.
    pub fn reply(&self, text: &str) -> RtmMessage {
        self.derive(text)
    }

    fn derive(&self, text: &str) -> RtmMessage {
        let message_type = self.message_type();
        let mut derived = RtmMessage::new()
            .with("text", text)
            .with("type", message_type);

        match message_type {
            RtmMessageType::ChannelMessage => {
                derived.copy_from(self, "channel_id", "channel_id");
                derived.copy_from(self, "vchannel_id", "vchannel_id");
            }
            RtmMessageType::P2pMessage => {
                derived.copy_from(self, "uid", "to_uid");
                derived.copy_from(self, "vchannel_id", "vchannel_id");
            }
            _ => {}
        }
        derived
    }

    fn copy_from(&mut self, source: &RtmMessage, from: &str, to: &str) {
        if let Some(value) = source.get(from) {
            self.insert(to, value.clone());
        }
    }
}

impl Index<&str> for RtmMessage {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for RtmMessage {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RtmMessage> for Value {
    fn from(m: RtmMessage) -> Self {
        Value::Object(m.0)
    }
}
