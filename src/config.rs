use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub keyboard: Option<KeyboardConfig>,
    #[serde(default)]
    pub defaults: DefaultReplies,
    #[serde(default)]
    pub replies: Vec<ReplyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Prefix both webhook routes are mounted under
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            base_path: default_base_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeyboardConfig {
    pub buttons: Vec<String>,
}

/// Replies used when no pattern reply matches
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DefaultReplies {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// A text reply sent when the message starts with one of `patterns`
#[derive(Debug, Deserialize, Clone)]
pub struct ReplyConfig {
    pub patterns: Vec<String>,
    pub text: String,
    /// Keyboard shown with this reply; falls back to `[keyboard]`
    #[serde(default)]
    pub buttons: Option<Vec<String>>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_path() -> String {
    "/".to_string()
}

/// Ensure a leading `/` and drop trailing ones (except for the root).
pub fn normalize_base_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.chars().any(char::is_whitespace) {
        bail!("base_path must not contain whitespace: {:?}", path);
    }
    let stripped = trimmed.trim_matches('/');
    if stripped.is_empty() {
        return Ok("/".to_string());
    }
    for segment in stripped.split('/') {
        if segment.is_empty() {
            bail!("base_path must not contain empty segments: {:?}", path);
        }
        // Router syntax; would become a capture or be rejected by axum
        if segment.starts_with(':')
            || segment.starts_with('*')
            || segment.contains(['{', '}'])
        {
            bail!("base_path segment {:?} is not a literal path", segment);
        }
    }
    Ok(format!("/{stripped}"))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.server.base_path = normalize_base_path(&config.server.base_path)?;
        for (i, reply) in config.replies.iter().enumerate() {
            if reply.patterns.is_empty() {
                bail!("replies[{}] has no patterns", i);
            }
        }
        Ok(config)
    }
}
