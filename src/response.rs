use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// Wire structs declare their fields in alphabetical order: the platform
// expects sorted keys and serde writes fields in declaration order.

/// Photo attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub height: u32,
    pub url: String,
    pub width: u32,
}

/// Link button shown under a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageButton {
    pub label: String,
    pub url: String,
}

/// Keyboard the platform shows after a reply or on the keyboard query.
///
/// Serializes to `{"type":"text"}` or `{"buttons":[...],"type":"buttons"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    Text,
    Buttons { buttons: Vec<String> },
}

#[derive(Serialize)]
struct KeyboardBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    buttons: Option<&'a [String]>,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl Serialize for Keyboard {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let body = match self {
            Keyboard::Text => KeyboardBody {
                buttons: None,
                kind: "text",
            },
            Keyboard::Buttons { buttons } => KeyboardBody {
                buttons: Some(buttons.as_slice()),
                kind: "buttons",
            },
        };
        body.serialize(serializer)
    }
}

impl Keyboard {
    pub fn from_buttons(buttons: Option<&[String]>) -> Self {
        match buttons {
            Some(buttons) => Keyboard::Buttons {
                buttons: buttons.to_vec(),
            },
            None => Keyboard::Text,
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).context("Failed to serialize keyboard")
    }

    /// Compact JSON with sorted keys and unescaped UTF-8.
    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize keyboard")
    }
}

#[derive(Serialize)]
struct Message<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message_button: Option<&'a MessageButton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a Photo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    keyboard: Keyboard,
    message: Message<'a>,
}

/// Reply built by a handler. Every field starts unset and only the fields a
/// handler sets are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub text: Option<String>,
    pub photo: Option<Photo>,
    pub message_button: Option<MessageButton>,
    pub keyboard_buttons: Option<Vec<String>>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyboard(&self) -> Keyboard {
        Keyboard::from_buttons(self.keyboard_buttons.as_deref())
    }

    fn envelope(&self) -> Envelope<'_> {
        Envelope {
            keyboard: self.keyboard(),
            message: Message {
                message_button: self.message_button.as_ref(),
                photo: self.photo.as_ref(),
                text: self.text.as_deref(),
            },
        }
    }

    /// The `{"keyboard": ..., "message": ...}` envelope as a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self.envelope()).context("Failed to serialize response")
    }

    /// The envelope as the webhook body: keys sorted at every level, compact
    /// separators, UTF-8 left unescaped. Parses to the same JSON as a
    /// `sort_keys` dump with `", "` separators and `\uXXXX` escapes, but is not
    /// byte-identical to one.
    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(&self.envelope()).context("Failed to serialize response")
    }
}
