//! Outbound SMS: the gateway trait the webhook handler sends through, plus its request and report types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub to: String,
    pub message: String,
    /// Sender id override; `None` or empty uses the gateway's default shortcode.
    pub from: Option<String>,
}

impl OutboundSms {
    pub fn new(to: impl Into<String>, message: impl Into<String>, from: Option<&str>) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
            from: from
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Gateway result for a send (`SMSMessageData` in Africa's Talking responses).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendReport {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

/// Per-recipient delivery status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl Recipient {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("sms request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sms api error: {0}")]
    Api(String),
}

/// Sends text messages. Errors are returned to the caller, never swallowed.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, sms: &OutboundSms) -> Result<SendReport, SmsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sender_override_is_dropped() {
        assert_eq!(OutboundSms::new("1", "m", Some("")).from, None);
        assert_eq!(OutboundSms::new("1", "m", Some("  ")).from, None);
        assert_eq!(OutboundSms::new("1", "m", None).from, None);
        assert_eq!(
            OutboundSms::new("1", "m", Some("20880")).from.as_deref(),
            Some("20880")
        );
    }

    #[test]
    fn report_decodes_gateway_payload() {
        let report: SendReport = serde_json::from_str(
            r#"{"Message":"Sent to 1/1 Total Cost: KES 0.8000","Recipients":[{"statusCode":101,"number":"+254711000000","status":"Success","cost":"KES 0.8000","messageId":"ATPid_1"}]}"#,
        )
        .unwrap();
        assert_eq!(report.recipients.len(), 1);
        assert!(report.recipients[0].is_success());
        assert_eq!(report.recipients[0].status_code, Some(101));
        assert_eq!(report.recipients[0].message_id.as_deref(), Some("ATPid_1"));
    }
}
