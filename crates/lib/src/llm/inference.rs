//! Hosted chat-completion client (OpenAI-compatible `/chat/completions`, e.g. GitHub Models).
//! One non-streaming request per call with fixed decoding parameters.

use crate::config::ModelConfig;
use crate::llm::{ChatMessage, ChatModel, ModelError, NO_RESPONSE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for an inference endpoint that speaks the chat-completions API with bearer auth.
#[derive(Clone)]
pub struct InferenceClient {
    base_url: String,
    token: String,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl InferenceClient {
    pub fn from_config(config: &ModelConfig, token: impl Into<String>) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            client: reqwest::Client::new(),
        }
    }

    /// POST /chat/completions: returns the first choice's content, or [`NO_RESPONSE`] when there is none.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            messages,
            temperature: self.temperature,
            top_p: self.top_p,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        let data: ChatCompletionResponse = res.json().await?;
        Ok(first_content(data).unwrap_or_else(|| NO_RESPONSE.to_string()))
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ModelError> {
        self.chat(messages).await
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn first_content(data: ChatCompletionResponse) -> Option<String> {
    data.choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|s| !s.is_empty())
}

/// Build an API error from a non-2xx response. Uses the `{"error": {"code", "message"}}` envelope when present, else the raw body.
fn api_error(status: u16, body: &str) -> ModelError {
    let envelope = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());
    let code = envelope
        .as_ref()
        .and_then(|e| e.get("code"))
        .and_then(|c| match c {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
    let message = envelope
        .as_ref()
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    ModelError::Api {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_reads_envelope() {
        let err = api_error(
            401,
            r#"{"error":{"code":"unauthorized","message":"Bad credentials"}}"#,
        );
        match err {
            ModelError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("unauthorized"));
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        match api_error(502, "bad gateway\n") {
            ModelError::Api { code, message, .. } => {
                assert_eq!(code, None);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn first_content_ignores_empty_and_missing() {
        let empty: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#).unwrap();
        assert_eq!(first_content(empty), None);
        let none: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_content(none), None);
        let null: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(first_content(null), None);
        let ok: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#)
                .unwrap();
        assert_eq!(first_content(ok).as_deref(), Some("Hi"));
    }
}
