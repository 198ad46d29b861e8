use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kakaoplus::config::Config;
use kakaoplus::platform::kakao;
use kakaoplus::{replies, Agent, HandlerRegistry};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,kakaoplus=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// First CLI argument, or `config.toml` in the working directory.
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn build_agent(config: &Config) -> Result<Agent> {
    let mut registry = HandlerRegistry::new();
    replies::register_configured(&mut registry, config)?;
    Ok(Agent::new(registry))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let path = config_path();
    let config = Config::load(&path)?;
    info!(
        config = %path.display(),
        bind_address = %config.server.bind_address,
        base_path = %config.server.base_path,
        replies = config.replies.len(),
        "Config loaded"
    );

    let agent = Arc::new(build_agent(&config)?);
    kakao::serve(agent, &config.server).await
}
