//! Africa's Talking SMS channel: sends messages via the messaging REST API.

use crate::channels::sms::{OutboundSms, SendReport, SmsError, SmsGateway};
use crate::config::SmsConfig;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct MessagingResponse {
    #[serde(rename = "SMSMessageData")]
    data: SendReport,
}

/// Africa's Talking connector. Holds credentials and a long-lived HTTP client.
#[derive(Clone)]
pub struct AfricasTalkingChannel {
    base_url: String,
    username: String,
    api_key: String,
    shortcode: String,
    client: reqwest::Client,
}

impl AfricasTalkingChannel {
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        api_key: impl Into<String>,
        shortcode: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            api_key: api_key.into(),
            shortcode: shortcode.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(
        config: &SmsConfig,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::new(&config.base_url, username, api_key, config.shortcode.clone())
    }

    /// Send a text message via POST /messaging. `from` falls back to the configured shortcode.
    pub async fn send_message(&self, sms: &OutboundSms) -> Result<SendReport, SmsError> {
        let url = format!("{}/messaging", self.base_url);
        let from = sms.from.as_deref().unwrap_or(&self.shortcode);
        let form = [
            ("username", self.username.as_str()),
            ("to", sms.to.as_str()),
            ("message", sms.message.as_str()),
            ("from", from),
        ];
        let res = self
            .client
            .post(&url)
            .header("apiKey", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SmsError::Api(format!("{} {}", status, body.trim())));
        }
        let data: MessagingResponse = res.json().await?;
        log::debug!("sms sent: {}", data.data.message);
        for r in data.data.recipients.iter().filter(|r| !r.is_success()) {
            log::warn!("sms to {} not accepted: {}", r.number, r.status);
        }
        Ok(data.data)
    }
}

#[async_trait]
impl SmsGateway for AfricasTalkingChannel {
    async fn send(&self, sms: &OutboundSms) -> Result<SendReport, SmsError> {
        self.send_message(sms).await
    }
}
