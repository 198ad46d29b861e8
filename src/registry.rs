use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::platform::{MessageType, Request};
use crate::response::Response;

/// Handler for an inbound message. Communicates only by mutating the response.
pub type MessageHandler = Arc<dyn Fn(&Request, &mut Response) -> Result<()> + Send + Sync>;

/// Handler for the keyboard query; expected to set `keyboard_buttons`.
pub type KeyboardHandler = Arc<dyn Fn(&mut Response) -> Result<()> + Send + Sync>;

/// A text handler guarded by one or more patterns
#[derive(Clone)]
pub struct PatternHandler {
    /// Patterns as registered, for logging
    sources: Vec<String>,
    /// Same patterns, anchored at the start of the content
    patterns: Vec<Regex>,
    handler: MessageHandler,
}

impl PatternHandler {
    fn new(sources: Vec<String>, handler: MessageHandler) -> Result<Self> {
        if sources.is_empty() {
            bail!("Pattern handler needs at least one pattern");
        }
        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(&format!(r"\A(?:{source})"))
                    .with_context(|| format!("Invalid handler pattern: {source}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            sources,
            patterns,
            handler,
        })
    }

    /// True if any pattern matches at the start of `content`.
    pub fn matches(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(content))
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// Registry of message and keyboard handlers.
///
/// Filled during setup, then handed to [`crate::agent::Agent`], which only
/// reads it.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    defaults: HashMap<MessageType, MessageHandler>,
    patterns: Vec<PatternHandler>,
    keyboard: Option<KeyboardHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback handler for a message type. A second registration for
    /// the same type replaces the first.
    pub fn register_default<F>(&mut self, message_type: MessageType, handler: F) -> Result<()>
    where
        F: Fn(&Request, &mut Response) -> Result<()> + Send + Sync + 'static,
    {
        if message_type == MessageType::Unknown {
            bail!("Cannot register a handler for unknown message types");
        }
        if self
            .defaults
            .insert(message_type, Arc::new(handler))
            .is_some()
        {
            warn!("Replaced default handler for {} messages", message_type);
        } else {
            info!("Registered default handler for {} messages", message_type);
        }
        Ok(())
    }

    /// Add a text handler guarded by `patterns`. Entries are tried in the
    /// order they were registered.
    pub fn register_pattern<I, S, F>(&mut self, patterns: I, handler: F) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Request, &mut Response) -> Result<()> + Send + Sync + 'static,
    {
        let sources: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let entry = PatternHandler::new(sources, Arc::new(handler))?;
        info!("Registered pattern handler: {:?}", entry.sources());
        self.patterns.push(entry);
        Ok(())
    }

    pub fn register_keyboard<F>(&mut self, handler: F)
    where
        F: Fn(&mut Response) -> Result<()> + Send + Sync + 'static,
    {
        if self.keyboard.replace(Arc::new(handler)).is_some() {
            warn!("Replaced keyboard handler");
        } else {
            info!("Registered keyboard handler");
        }
    }

    /// Pick the handler for a request.
    ///
    /// Text: first pattern entry with a matching pattern, then the text
    /// default. Other known types: their default only. Unknown: none.
    pub fn resolve(&self, request: &Request) -> Option<&MessageHandler> {
        match request.message_type {
            MessageType::Unknown => None,
            MessageType::Text => self
                .patterns
                .iter()
                .find(|entry| entry.matches(&request.content))
                .map(|entry| &entry.handler)
                .or_else(|| self.defaults.get(&MessageType::Text)),
            other => self.defaults.get(&other),
        }
    }

    pub fn keyboard(&self) -> Option<&KeyboardHandler> {
        self.keyboard.as_ref()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn has_default(&self, message_type: MessageType) -> bool {
        self.defaults.contains_key(&message_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> Request {
        Request::new("user", MessageType::Text, content)
    }

    fn set_text(value: &'static str) -> impl Fn(&Request, &mut Response) -> Result<()> {
        move |_req, res| {
            res.text = Some(value.to_string());
            Ok(())
        }
    }

    /// Run whichever handler resolves and return the text it set.
    fn run(registry: &HandlerRegistry, request: &Request) -> Option<String> {
        let handler = registry.resolve(request)?;
        let mut res = Response::new();
        handler(request, &mut res).unwrap();
        res.text
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let registry = HandlerRegistry::new();
        assert!(registry.resolve(&text("hello")).is_none());
        assert!(registry.keyboard().is_none());
    }

    #[test]
    fn test_pattern_anchored_at_start() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_pattern(["(hi).*"], set_text("greeting"))
            .unwrap();

        assert_eq!(run(&registry, &text("hi my name is yo")).as_deref(), Some("greeting"));
        assert!(registry.resolve(&text("oh hi")).is_none());
    }

    #[test]
    fn test_pattern_is_prefix_not_full_match() {
        let mut registry = HandlerRegistry::new();
        registry.register_pattern(["hi"], set_text("prefix")).unwrap();
        assert_eq!(run(&registry, &text("hi there")).as_deref(), Some("prefix"));
    }

    #[test]
    fn test_any_pattern_in_entry_matches() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_pattern(["hello", "안녕"], set_text("multi"))
            .unwrap();
        assert_eq!(run(&registry, &text("안녕하세요")).as_deref(), Some("multi"));
        assert_eq!(run(&registry, &text("hello")).as_deref(), Some("multi"));
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let mut registry = HandlerRegistry::new();
        registry.register_pattern(["a|b"], set_text("alt")).unwrap();
        assert_eq!(run(&registry, &text("b")).as_deref(), Some("alt"));
        assert!(registry.resolve(&text("xb")).is_none());
    }

    #[test]
    fn test_first_registered_pattern_wins() {
        let mut registry = HandlerRegistry::new();
        registry.register_pattern(["hi"], set_text("first")).unwrap();
        registry.register_pattern(["hi.*"], set_text("second")).unwrap();
        assert_eq!(registry.pattern_count(), 2);
        assert_eq!(run(&registry, &text("hi")).as_deref(), Some("first"));
    }

    #[test]
    fn test_falls_back_to_text_default() {
        let mut registry = HandlerRegistry::new();
        registry.register_pattern(["hi"], set_text("pattern")).unwrap();
        registry
            .register_default(MessageType::Text, set_text("default"))
            .unwrap();
        assert_eq!(run(&registry, &text("bye")).as_deref(), Some("default"));
    }

    #[test]
    fn test_default_last_registration_wins() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_default(MessageType::Text, set_text("old"))
            .unwrap();
        registry
            .register_default(MessageType::Text, set_text("new"))
            .unwrap();
        assert_eq!(run(&registry, &text("anything")).as_deref(), Some("new"));
    }

    #[test]
    fn test_patterns_ignored_for_photo() {
        let mut registry = HandlerRegistry::new();
        registry.register_pattern([".*"], set_text("pattern")).unwrap();
        let photo = Request::new("user", MessageType::Photo, "image.png");
        assert!(registry.resolve(&photo).is_none());

        registry
            .register_default(MessageType::Photo, set_text("photo"))
            .unwrap();
        assert!(registry.has_default(MessageType::Photo));
        assert_eq!(run(&registry, &photo).as_deref(), Some("photo"));
    }

    #[test]
    fn test_unknown_type_never_resolves() {
        let mut registry = HandlerRegistry::new();
        registry.register_pattern([".*"], set_text("pattern")).unwrap();
        registry
            .register_default(MessageType::Text, set_text("default"))
            .unwrap();
        let unknown = Request::new("user", MessageType::Unknown, "hi");
        assert!(registry.resolve(&unknown).is_none());
        assert!(registry
            .register_default(MessageType::Unknown, set_text("nope"))
            .is_err());
    }

    #[test]
    fn test_invalid_or_empty_patterns_rejected() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.register_pattern(["(unclosed"], set_text("x")).is_err());
        assert!(registry
            .register_pattern(Vec::<String>::new(), set_text("x"))
            .is_err());
        assert_eq!(registry.pattern_count(), 0);
    }

    #[test]
    fn test_keyboard_handler_registered() {
        let mut registry = HandlerRegistry::new();
        registry.register_keyboard(|res| {
            res.keyboard_buttons = Some(vec!["a".to_string()]);
            Ok(())
        });
        let handler = registry.keyboard().unwrap();
        let mut res = Response::new();
        handler(&mut res).unwrap();
        assert_eq!(res.keyboard_buttons, Some(vec!["a".to_string()]));
    }
}
