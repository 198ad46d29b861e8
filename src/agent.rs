use anyhow::Result;
use tracing::{debug, info};

use crate::platform::Request;
use crate::registry::HandlerRegistry;
use crate::response::{Keyboard, Response};

/// Body returned by the message webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReply {
    /// No handler ran; answered with the literal `ok`
    Ack,
    /// Serialized [`Response`] envelope
    Json(String),
}

impl WebhookReply {
    pub const ACK_BODY: &'static str = "ok";

    pub fn body(&self) -> &str {
        match self {
            WebhookReply::Ack => Self::ACK_BODY,
            WebhookReply::Json(body) => body,
        }
    }
}

/// Dispatches webhook calls to the handlers in a [`HandlerRegistry`].
pub struct Agent {
    registry: HandlerRegistry,
}

impl Agent {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Parse a raw message webhook body and dispatch it.
    pub fn handle_webhook(&self, body: &[u8]) -> Result<WebhookReply> {
        let request = Request::from_slice(body)?;
        self.dispatch(&request)
    }

    /// Run the handler resolved for `request` against a fresh [`Response`].
    ///
    /// Handler errors are returned as-is.
    pub fn dispatch(&self, request: &Request) -> Result<WebhookReply> {
        let Some(handler) = self.registry.resolve(request) else {
            debug!(
                user_key = %request.user_key,
                message_type = %request.message_type,
                "No handler matched, acknowledging"
            );
            return Ok(WebhookReply::Ack);
        };

        info!(
            user_key = %request.user_key,
            message_type = %request.message_type,
            "Dispatching message"
        );

        let mut response = Response::new();
        handler(request, &mut response)?;
        Ok(WebhookReply::Json(response.to_body()?))
    }

    /// Answer the keyboard query.
    ///
    /// Without a keyboard handler, or if it leaves `keyboard_buttons` unset,
    /// the plain text keyboard is returned.
    pub fn handle_keyboard_query(&self) -> Result<Keyboard> {
        let Some(handler) = self.registry.keyboard() else {
            return Ok(Keyboard::Text);
        };
        let mut response = Response::new();
        handler(&mut response)?;
        Ok(response.keyboard())
    }
}
