//! Webhook adapter for the KakaoTalk Plus Friend auto-reply API.
//!
//! Register handlers on a [`HandlerRegistry`], move it into an [`Agent`] and
//! mount [`platform::kakao::router`] to answer the platform's `message` and
//! `keyboard` callbacks.

pub mod agent;
pub mod config;
pub mod platform;
pub mod registry;
pub mod replies;
pub mod response;

pub use agent::{Agent, WebhookReply};
pub use platform::{MessageType, Request};
pub use registry::HandlerRegistry;
pub use response::{Keyboard, MessageButton, Photo, Response};
