// RTM frames as the server sends them, and the frames we send back.

use bearychat::{RtmMessage, RtmMessageType, User};

const CHANNEL_FRAME: &str = r#"{
    "type": "channel_message",
    "key": "1485236262366.0193",
    "uid": "=bw52O",
    "channel_id": "=bw9sA",
    "vchannel_id": "=bw9sA",
    "text": "@<==bwBot=> deploy please",
    "ts": 1485236262366,
    "robot_id": null,
    "refer_key": null
}"#;

const P2P_FRAME: &str = r#"{
    "type": "message",
    "key": "1485236263000.0001",
    "uid": "=bw52O",
    "vchannel_id": "=bw52O=bwBot",
    "text": "ping"
}"#;

#[test]
fn channel_frame_classification() {
    let m = RtmMessage::parse(CHANNEL_FRAME).unwrap();
    assert_eq!(m.message_type(), RtmMessageType::ChannelMessage);
    assert!(m.is_chat_message());
    assert!(!m.is_p2p());
    assert!(m.is_mention_user(&User::new("=bwBot")));
    assert!(!m.is_from_me(&User::new("=bwBot")));
}

#[test]
fn refer_to_channel_frame_serializes_expected_fields() {
    let m = RtmMessage::parse(CHANNEL_FRAME).unwrap();
    let out = serde_json::to_value(m.refer("on it")).unwrap();

    assert_eq!(out["type"], "channel_message");
    assert_eq!(out["text"], "on it");
    assert_eq!(out["channel_id"], "=bw9sA");
    assert_eq!(out["vchannel_id"], "=bw9sA");
    assert_eq!(out["refer_key"], "1485236262366.0193");
    // sender uid and source key stay out of the refer
    assert!(out.get("uid").is_none());
    assert!(out.get("key").is_none());
}

#[test]
fn reply_to_p2p_frame_addresses_sender() {
    let m = RtmMessage::parse(P2P_FRAME).unwrap();
    assert!(m.is_p2p());

    let out = serde_json::to_value(m.reply("pong")).unwrap();
    assert_eq!(out["type"], "message");
    assert_eq!(out["to_uid"], "=bw52O");
    assert_eq!(out["vchannel_id"], "=bw52O=bwBot");
    assert!(out.get("refer_key").is_none());
    assert!(out.get("channel_id").is_none());
}

#[test]
fn unknown_frame_type_still_parses() {
    let m = RtmMessage::parse(r#"{"type":"hello","data":{}}"#).unwrap();
    assert_eq!(m.message_type(), RtmMessageType::Unknown);
    assert!(!m.is_chat_message());
}

#[test]
fn malformed_frame_is_decode_error() {
    assert!(RtmMessage::parse("{not json").is_err());
}
