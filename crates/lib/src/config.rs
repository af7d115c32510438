//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.smsai/config.json`) and environment.
//! Secrets (model token, SMS gateway credentials) are usually supplied via env and override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted chat-completion endpoint and decoding parameters.
    #[serde(default)]
    pub model: ModelConfig,

    /// SMS gateway credentials and default shortcode.
    #[serde(default)]
    pub sms: SmsConfig,

    /// Reply formatting limits.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Per-sender conversation window (multi-turn variant).
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Bind address, port and webhook route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Port for HTTP (default 3000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Route the SMS gateway POSTs inbound messages to (default "/api/sms").
    #[serde(default = "default_server_path")]
    pub path: String,
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_path() -> String {
    "/api/sms".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            port: default_server_port(),
            path: default_server_path(),
        }
    }
}

/// Chat-completion endpoint settings. Decoding parameters are fixed per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Inference base URL; `/chat/completions` is appended.
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,

    /// Model identifier sent in every request.
    #[serde(default = "default_model_id")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System message placed before the conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Access token for the inference endpoint. Overridden by GITHUB_TOKEN env.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_model_endpoint() -> String {
    "https://models.github.ai/inference".to_string()
}

fn default_model_id() -> String {
    "deepseek/DeepSeek-V3-0324".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    50
}

fn default_system_prompt() -> String {
    "You are a concise assistant. Respond in under 45 words and 200 characters. Be clear, factual, and to the point. Avoid greetings or extra phrases.".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            model: default_model_id(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            token: None,
        }
    }
}

/// Africa's Talking SMS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsConfig {
    /// API base URL (use `https://api.sandbox.africastalking.com/version1` for the sandbox).
    #[serde(default = "default_sms_base_url")]
    pub base_url: String,

    /// Account username. Overridden by SMS_USERNAME env.
    #[serde(default)]
    pub username: Option<String>,

    /// API key. Overridden by SMS_API env.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender id used when the inbound message carried no recipient shortcode.
    #[serde(default = "default_shortcode")]
    pub shortcode: String,
}

fn default_sms_base_url() -> String {
    "https://api.africastalking.com/version1".to_string()
}

fn default_shortcode() -> String {
    "1619".to_string()
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            base_url: default_sms_base_url(),
            username: None,
            api_key: None,
            shortcode: default_shortcode(),
        }
    }
}

/// Whether a model reply is delivered as one SMS or split into several parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// One message, at most `maxChars` characters.
    #[default]
    Single,
    /// Successive parts of at most `segmentChars` characters each.
    Multi,
}

/// Reply length limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyConfig {
    #[serde(default)]
    pub mode: ReplyMode,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Characters per part in multi mode (153 = one concatenated GSM segment).
    #[serde(default = "default_segment_chars")]
    pub segment_chars: usize,
}

fn default_max_chars() -> usize {
    200
}

fn default_max_words() -> usize {
    45
}

fn default_segment_chars() -> usize {
    153
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            mode: ReplyMode::default(),
            max_chars: default_max_chars(),
            max_words: default_max_words(),
            segment_chars: default_segment_chars(),
        }
    }
}

/// Conversation window settings. Disabled by default (single-turn route).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Most recent user turns kept per sender.
    #[serde(default = "default_user_turns")]
    pub user_turns: usize,

    /// Most recent assistant turns kept per sender.
    #[serde(default = "default_assistant_turns")]
    pub assistant_turns: usize,

    /// Distinct senders kept before the least recently used one is evicted.
    #[serde(default = "default_max_senders")]
    pub max_senders: usize,
}

fn default_user_turns() -> usize {
    3
}

fn default_assistant_turns() -> usize {
    1
}

fn default_max_senders() -> usize {
    1024
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_turns: default_user_turns(),
            assistant_turns: default_assistant_turns(),
            max_senders: default_max_senders(),
        }
    }
}

/// Read an env var, ignoring unset and blank values.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the inference token: env GITHUB_TOKEN overrides config.
pub fn resolve_model_token(config: &Config) -> Option<String> {
    env_non_empty("GITHUB_TOKEN").or_else(|| non_empty(config.model.token.as_ref()))
}

/// Resolve the SMS gateway API key: env SMS_API overrides config.
pub fn resolve_sms_api_key(config: &Config) -> Option<String> {
    env_non_empty("SMS_API").or_else(|| non_empty(config.sms.api_key.as_ref()))
}

/// Resolve the SMS gateway username: env SMS_USERNAME overrides config.
pub fn resolve_sms_username(config: &Config) -> Option<String> {
    env_non_empty("SMS_USERNAME").or_else(|| non_empty(config.sms.username.as_ref()))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SMSAI_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".smsai").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, SMSAI_CONFIG_PATH, or the default. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
