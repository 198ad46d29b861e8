pub mod kakao;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Kind of an inbound message, as sent in the payload's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    Text,
    Photo,
    /// Missing or unrecognised `type`; never dispatched to a handler
    #[default]
    Unknown,
}

impl MessageType {
    pub fn parse(value: &str) -> Self {
        match value {
            "text" => MessageType::Text,
            "photo" => MessageType::Photo,
            _ => MessageType::Unknown,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Text => write!(f, "text"),
            MessageType::Photo => write!(f, "photo"),
            MessageType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Wire shape of the webhook body. Every field may be absent.
#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(default)]
    user_key: Option<String>,
    #[serde(default, rename = "type")]
    message_type: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// A message delivered by the platform's message webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Platform-assigned, per-bot identifier of the sender
    pub user_key: String,
    pub message_type: MessageType,
    /// Message text, or the photo URL for photo messages
    pub content: String,
}

impl Request {
    pub fn new(
        user_key: impl Into<String>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user_key: user_key.into(),
            message_type,
            content: content.into(),
        }
    }

    /// Parse a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let raw: RawRequest =
            serde_json::from_slice(body).context("Failed to parse webhook payload")?;
        Ok(Self::from_raw(raw))
    }

    /// Build from an already parsed JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawRequest =
            serde_json::from_value(value).context("Failed to read webhook payload")?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawRequest) -> Self {
        Self {
            user_key: raw.user_key.unwrap_or_default(),
            message_type: raw
                .message_type
                .as_deref()
                .map(MessageType::parse)
                .unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
        }
    }

    pub fn received_text(&self) -> bool {
        self.message_type == MessageType::Text
    }

    pub fn received_photo(&self) -> bool {
        self.message_type == MessageType::Photo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_payload() {
        let req = Request::from_slice(br#"{"user_key":"testID","type":"text","content":"test"}"#)
            .unwrap();
        assert_eq!(req.user_key, "testID");
        assert_eq!(req.content, "test");
        assert!(req.received_text());
        assert!(!req.received_photo());
    }

    #[test]
    fn test_photo_payload() {
        let req = Request::from_value(json!({
            "user_key": "testID",
            "type": "photo",
            "content": "image.png"
        }))
        .unwrap();
        assert_eq!(req.message_type, MessageType::Photo);
        assert!(req.received_photo());
        assert!(!req.received_text());
    }

    #[test]
    fn test_missing_type_is_unknown() {
        let req = Request::from_value(json!({"user_key": "testID"})).unwrap();
        assert_eq!(req.message_type, MessageType::Unknown);
        assert_eq!(req.content, "");
        assert!(!req.received_text());
        assert!(!req.received_photo());
    }

    #[test]
    fn test_unrecognised_type_is_unknown() {
        let req = Request::from_value(json!({"user_key": "u", "type": "video", "content": "x"}))
            .unwrap();
        assert_eq!(req.message_type, MessageType::Unknown);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let req = Request::from_value(json!({
            "user_key": "u",
            "type": "text",
            "content": "hi",
            "extra": {"nested": true}
        }))
        .unwrap();
        assert!(req.received_text());
    }

    #[test]
    fn test_malformed_body_is_error() {
        assert!(Request::from_slice(b"not json").is_err());
        assert!(Request::from_slice(b"[1, 2]").is_err());
        assert!(Request::from_value(json!({"type": 3})).is_err());
    }

    #[test]
    fn test_message_type_display() {
        assert_eq!(MessageType::Text.to_string(), "text");
        assert_eq!(MessageType::parse("photo"), MessageType::Photo);
        assert_eq!(MessageType::parse("TEXT"), MessageType::Unknown);
    }
}
