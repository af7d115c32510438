//! POST handler for inbound SMS: parse, ask the model, format, reply by SMS.
//!
//! Each stage returns a `Result`; [`sms_webhook`] maps the failure kind to a status code and
//! decides whether the sender gets an apology SMS. Nothing is retried.

use crate::channels::{InboundError, InboundMessage, OutboundSms, SmsError};
use crate::conversation::ConversationEntry;
use crate::gateway::server::AppState;
use crate::llm::{ChatMessage, ModelError};
use crate::reply;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, http::StatusCode};

pub const RESPONSE_PROCESSED: &str = "SMS processed";
pub const RESPONSE_MISSING_FIELDS: &str = "Missing sender or message text";
pub const RESPONSE_MODEL_ERROR: &str = "AI model error";
pub const RESPONSE_SERVER_ERROR: &str = "Server error";

/// SMS sent to the sender when the model endpoint returns an error envelope.
pub const SMS_MODEL_ERROR: &str = "Error processing your query. Please try again.";
/// SMS sent (best effort) when anything else fails after the sender is known.
pub const SMS_SERVER_ERROR: &str = "Server error. Please try again later.";

#[derive(Debug, thiserror::Error)]
enum HandleError {
    #[error("missing sender or message text")]
    Validation,
    #[error("{0}")]
    ModelUnavailable(ModelError),
    #[error("{0}")]
    Model(ModelError),
    #[error("{0}")]
    Sms(#[from] SmsError),
}

impl From<ModelError> for HandleError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Api { .. } => HandleError::ModelUnavailable(e),
            ModelError::Request(_) => HandleError::Model(e),
        }
    }
}

/// Failures before a message was parsed: the sender is unknown, so no SMS can go out.
#[derive(Debug, thiserror::Error)]
enum BodyError {
    #[error("reading body: {0}")]
    Read(#[from] BytesRejection),
    #[error(transparent)]
    Parse(#[from] InboundError),
}

/// Build the chat request: system prompt, prior turns (oldest first), then the new user text.
pub fn build_prompt(
    system_prompt: &str,
    history: &[ConversationEntry],
    text: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if !system_prompt.trim().is_empty() {
        messages.push(ChatMessage::system(system_prompt));
    }
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(text));
    messages
}

/// Log correlation id: the gateway's message id, or a generated one.
fn correlation_id(msg: &InboundMessage) -> String {
    if msg.id.is_empty() {
        format!("req-{}", uuid::Uuid::new_v4())
    } else {
        msg.id.clone()
    }
}

fn parse_body(body: Result<Bytes, BytesRejection>) -> Result<InboundMessage, BodyError> {
    let body = body?;
    log::debug!("raw sms body: {}", String::from_utf8_lossy(&body));
    Ok(InboundMessage::parse(&body)?)
}

/// POST {server.path}: inbound SMS notification (form-encoded). Always answers in plain text.
pub async fn sms_webhook(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> (StatusCode, &'static str) {
    let inbound = match parse_body(body) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("sms webhook: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, RESPONSE_SERVER_ERROR);
        }
    };
    let request_id = correlation_id(&inbound);
    log::info!(
        "[{}] received sms from {:?} to {:?} ({} chars)",
        request_id,
        inbound.from,
        inbound.to,
        inbound.text.len()
    );

    match process(&state, &inbound, &request_id).await {
        Ok(parts) => {
            log::info!("[{}] replied to {} in {} part(s)", request_id, inbound.from, parts);
            (StatusCode::OK, RESPONSE_PROCESSED)
        }
        Err(HandleError::Validation) => {
            log::warn!("[{}] {}", request_id, RESPONSE_MISSING_FIELDS);
            (StatusCode::BAD_REQUEST, RESPONSE_MISSING_FIELDS)
        }
        Err(HandleError::ModelUnavailable(e)) => {
            log::warn!("[{}] ai model error: {}", request_id, e);
            let apology = OutboundSms::new(&inbound.from, SMS_MODEL_ERROR, Some(inbound.to.as_str()));
            match state.sms.send(&apology).await {
                Ok(_) => (StatusCode::INTERNAL_SERVER_ERROR, RESPONSE_MODEL_ERROR),
                Err(e) => server_error(&state, &inbound, &request_id, e.into()).await,
            }
        }
        Err(e) => server_error(&state, &inbound, &request_id, e).await,
    }
}

async fn process(
    state: &AppState,
    inbound: &InboundMessage,
    request_id: &str,
) -> Result<usize, HandleError> {
    if !inbound.is_complete() {
        return Err(HandleError::Validation);
    }

    let history = match &state.conversations {
        Some(window) => window.get(&inbound.from).await,
        None => Vec::new(),
    };
    let messages = build_prompt(&state.config.model.system_prompt, &history, &inbound.text);
    let raw = state.model.complete(messages).await?;
    log::debug!("[{}] model reply: {:?}", request_id, raw);

    let parts = reply::format_reply(&raw, &state.config.reply);
    for part in &parts {
        let sms = OutboundSms::new(&inbound.from, part.as_str(), Some(inbound.to.as_str()));
        state.sms.send(&sms).await?;
    }

    // Only delivered replies enter the history.
    if let Some(window) = &state.conversations {
        window
            .update(&inbound.from, &inbound.text, &parts.join(" "))
            .await;
    }
    Ok(parts.len())
}

/// Log the failure, notify the sender when both addresses are known (errors ignored), answer 500.
async fn server_error(
    state: &AppState,
    inbound: &InboundMessage,
    request_id: &str,
    err: HandleError,
) -> (StatusCode, &'static str) {
    log::warn!("[{}] error processing sms request: {}", request_id, err);
    if !inbound.from.is_empty() && !inbound.to.is_empty() {
        let notice = OutboundSms::new(&inbound.from, SMS_SERVER_ERROR, Some(inbound.to.as_str()));
        if let Err(e) = state.sms.send(&notice).await {
            log::warn!("[{}] server error notice not sent: {}", request_id, e);
        }
    }
    (StatusCode::INTERNAL_SERVER_ERROR, RESPONSE_SERVER_ERROR)
}
