//! Handlers described by the config file, so the server can answer without
//! custom code.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::platform::MessageType;
use crate::registry::HandlerRegistry;

/// Register `[[replies]]` (in file order), `[defaults]` and `[keyboard]`.
pub fn register_configured(registry: &mut HandlerRegistry, config: &Config) -> Result<()> {
    let keyboard = config.keyboard.as_ref().map(|k| k.buttons.clone());

    for (i, reply) in config.replies.iter().enumerate() {
        let text = reply.text.clone();
        let buttons = reply.buttons.clone().or_else(|| keyboard.clone());
        registry
            .register_pattern(reply.patterns.iter().cloned(), move |_req, res| {
                res.text = Some(text.clone());
                res.keyboard_buttons = buttons.clone();
                Ok(())
            })
            .with_context(|| format!("Failed to register replies[{}]", i))?;
    }

    let defaults = [
        (MessageType::Text, config.defaults.text.as_ref()),
        (MessageType::Photo, config.defaults.photo.as_ref()),
    ];
    for (message_type, text) in defaults {
        let Some(text) = text.cloned() else {
            continue;
        };
        let buttons = keyboard.clone();
        registry.register_default(message_type, move |_req, res| {
            res.text = Some(text.clone());
            res.keyboard_buttons = buttons.clone();
            Ok(())
        })?;
    }

    if let Some(buttons) = keyboard {
        registry.register_keyboard(move |res| {
            res.keyboard_buttons = Some(buttons.clone());
            Ok(())
        });
    }

    info!(
        "Configured {} pattern replies, text default: {}, photo default: {}",
        config.replies.len(),
        config.defaults.text.is_some(),
        config.defaults.photo.is_some()
    );
    Ok(())
}
