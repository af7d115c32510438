//! Chat-model abstraction and the hosted inference client.
//!
//! The gateway only sees [`ChatModel`], so tests can swap in a double for the real endpoint.

mod inference;

pub use inference::InferenceClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Returned in place of a reply when the completion carried no content.
pub const NO_RESPONSE: &str = "No response from AI.";

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Network failure or an undecodable response body.
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The endpoint answered with an error envelope (non-2xx).
    #[error("model api error: {status} {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

/// A chat-completion backend: messages in, reply text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ModelError>;
}
