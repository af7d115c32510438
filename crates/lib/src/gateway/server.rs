//! Webhook HTTP server: shared state, routes, startup and graceful shutdown.

use crate::channels::{AfricasTalkingChannel, SmsGateway};
use crate::config::{self, Config};
use crate::conversation::ConversationWindow;
use crate::gateway::webhook::sms_webhook;
use crate::llm::{ChatModel, InferenceClient};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for request handlers. Clients are built once per process and injected here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<dyn ChatModel>,
    pub sms: Arc<dyn SmsGateway>,
    /// Present when `conversation.enabled` is set.
    pub conversations: Option<Arc<ConversationWindow>>,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn ChatModel>, sms: Arc<dyn SmsGateway>) -> Self {
        let conversations = if config.conversation.enabled {
            Some(Arc::new(ConversationWindow::from_config(&config.conversation)))
        } else {
            None
        };
        Self {
            config: Arc::new(config),
            model,
            sms,
            conversations,
        }
    }
}

/// Webhook route from config, with a leading slash.
fn webhook_path(config: &Config) -> String {
    let p = config.server.path.trim();
    if p.starts_with('/') {
        p.to_string()
    } else {
        format!("/{}", p)
    }
}

/// Routes: `GET /` health, `POST {server.path}` inbound SMS.
pub fn router(state: AppState) -> Router {
    let path = webhook_path(&state.config);
    Router::new()
        .route("/", get(health_http))
        .route(&path, post(sms_webhook))
        .with_state(state)
}

/// Build the inference client from config and env; fails when no token is available.
pub fn model_client(config: &Config) -> Result<InferenceClient> {
    let token = config::resolve_model_token(config)
        .context("model token not configured (set GITHUB_TOKEN or model.token)")?;
    Ok(InferenceClient::from_config(&config.model, token))
}

/// Build the SMS gateway client from config and env; fails when credentials are missing.
pub fn sms_client(config: &Config) -> Result<AfricasTalkingChannel> {
    let username = config::resolve_sms_username(config)
        .context("sms username not configured (set SMS_USERNAME or sms.username)")?;
    let api_key = config::resolve_sms_api_key(config)
        .context("sms api key not configured (set SMS_API or sms.apiKey)")?;
    Ok(AfricasTalkingChannel::from_config(&config.sms, username, api_key))
}

/// Run the webhook server on config.server.bind:config.server.port. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let model = Arc::new(model_client(&config)?);
    let sms = Arc::new(sms_client(&config)?);
    if config.conversation.enabled {
        log::info!(
            "conversation window enabled ({} user + {} assistant turns, {} senders)",
            config.conversation.user_turns,
            config.conversation.assistant_turns,
            config.conversation.max_senders
        );
    }
    log::info!(
        "model {} at {} (reply mode {:?})",
        config.model.model,
        config.model.endpoint,
        config.reply.mode
    );

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let path = webhook_path(&config);
    let app = router(AppState::new(config, model, sms));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("listening on {} (webhook {})", bind_addr, path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited")?;
    log::info!("server stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.server.port,
    }))
}
