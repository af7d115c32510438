//! Test doubles for the model and SMS gateway, and a helper to serve the router on a free port.

#![allow(dead_code)]

use async_trait::async_trait;
use lib::channels::{OutboundSms, SendReport, SmsError, SmsGateway};
use lib::config::Config;
use lib::gateway::{self, AppState};
use lib::llm::{ChatMessage, ChatModel, ModelError};
use std::sync::{Arc, Mutex};

/// What the fake model answers with.
#[derive(Clone)]
pub enum FakeReply {
    Text(String),
    Envelope,
    Transport,
}

pub struct FakeModel {
    reply: FakeReply,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeModel {
    pub fn new(reply: FakeReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn text(reply: &str) -> Arc<Self> {
        Self::new(FakeReply::Text(reply.to_string()))
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(messages);
        match &self.reply {
            FakeReply::Text(t) => Ok(t.clone()),
            FakeReply::Envelope => Err(ModelError::Api {
                status: 401,
                code: Some("unauthorized".to_string()),
                message: "Bad credentials".to_string(),
            }),
            FakeReply::Transport => {
                // nothing listens on port 1, so this is a real connection error
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
                    .expect_err("port 1 should refuse connections");
                Err(ModelError::Request(err))
            }
        }
    }
}

/// Records every send attempt; the first `fail_first` attempts fail.
pub struct FakeSms {
    fail_first: usize,
    pub sent: Mutex<Vec<OutboundSms>>,
}

impl FakeSms {
    pub fn new() -> Arc<Self> {
        Self::failing_first(0)
    }

    pub fn failing() -> Arc<Self> {
        Self::failing_first(usize::MAX)
    }

    pub fn failing_first(fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<OutboundSms> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsGateway for FakeSms {
    async fn send(&self, sms: &OutboundSms) -> Result<SendReport, SmsError> {
        let attempt = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(sms.clone());
            sent.len()
        };
        if attempt <= self.fail_first {
            return Err(SmsError::Api("401 Unauthorized".to_string()));
        }
        Ok(SendReport::default())
    }
}

/// Serve the router for `config` with the given doubles; returns the base URL.
pub async fn spawn_app(config: Config, model: Arc<FakeModel>, sms: Arc<FakeSms>) -> String {
    let state = AppState::new(config, model, sms);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, gateway::router(state)).await;
    });
    format!("http://{}", addr)
}

/// POST a form body to the default webhook route; returns (status, body).
pub async fn post_sms(base: &str, body: &str) -> (u16, String) {
    let res = reqwest::Client::new()
        .post(format!("{}/api/sms", base))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body.to_string())
        .send()
        .await
        .expect("post webhook");
    let status = res.status().as_u16();
    let text = res.text().await.expect("read body");
    (status, text)
}
