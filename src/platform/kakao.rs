use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tracing::{error, info, warn};

use crate::agent::{Agent, WebhookReply};
use crate::config::{normalize_base_path, ServerConfig};
use crate::platform::Request;

/// Join a normalized base path and a route, e.g. `("/bot", "message")` -> `/bot/message`.
fn route_path(base_path: &str, route: &str) -> String {
    let base = base_path.trim_end_matches('/');
    format!("{base}/{route}")
}

/// Build the webhook router with `POST <base>/message` and `GET <base>/keyboard`.
///
/// `base_path` goes through [`normalize_base_path`], so `"bot"` and `"/bot/"`
/// both mount under `/bot`; paths axum would read as captures are rejected.
pub fn router(agent: Arc<Agent>, base_path: &str) -> Result<Router> {
    let base_path = normalize_base_path(base_path)
        .with_context(|| format!("Invalid webhook base path: {base_path:?}"))?;
    Ok(Router::new()
        .route(&route_path(&base_path, "message"), post(handle_message))
        .route(&route_path(&base_path, "keyboard"), get(handle_keyboard))
        .with_state(agent))
}

fn json_body(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn handle_message(State(agent): State<Arc<Agent>>, body: Bytes) -> Response {
    let request = match Request::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected webhook payload: {:#}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match agent.dispatch(&request) {
        Ok(WebhookReply::Json(body)) => json_body(body),
        Ok(WebhookReply::Ack) => WebhookReply::ACK_BODY.into_response(),
        Err(e) => {
            error!(
                user_key = %request.user_key,
                "Handler failed: {:#}", e
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn handle_keyboard(State(agent): State<Arc<Agent>>) -> Response {
    match agent
        .handle_keyboard_query()
        .and_then(|keyboard| keyboard.to_body())
    {
        Ok(body) => json_body(body),
        Err(e) => {
            error!("Keyboard handler failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve the webhook routes until Ctrl-C.
pub async fn serve(agent: Arc<Agent>, config: &ServerConfig) -> Result<()> {
    let app = router(agent, &config.base_path)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    info!(
        "Listening on {} (message: {}, keyboard: {})",
        config.bind_address,
        route_path(&config.base_path, "message"),
        route_path(&config.base_path, "keyboard")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
