//! Inbound SMS notification: the form-encoded body the SMS gateway POSTs to the webhook.

/// A received SMS, normalized from the webhook body. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone number.
    pub from: String,
    /// Shortcode or number the message was sent to.
    pub to: String,
    pub text: String,
    pub date: String,
    /// Gateway message id; used as the correlation id in logs.
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid form body: {0}")]
pub struct InboundError(#[from] serde_urlencoded::de::Error);

impl InboundMessage {
    /// Parse an `application/x-www-form-urlencoded` body. The first value wins for repeated keys; unknown keys are ignored.
    pub fn parse(body: &[u8]) -> Result<Self, InboundError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
        let field = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        Ok(Self {
            from: field("from"),
            to: field("to"),
            text: field("text"),
            date: field("date"),
            id: field("id"),
        })
    }

    /// True when both the sender and the message text are present.
    pub fn is_complete(&self) -> bool {
        !self.from.is_empty() && !self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gateway_fields() {
        let body = b"linkId=abc&text=What+is+the+capital%3F&to=1619&id=ATXid_1&date=2025-01-02+10%3A00%3A00&from=%2B254711000000&networkCode=63902";
        let msg = InboundMessage::parse(body).unwrap();
        assert_eq!(msg.from, "+254711000000");
        assert_eq!(msg.to, "1619");
        assert_eq!(msg.text, "What is the capital?");
        assert_eq!(msg.date, "2025-01-02 10:00:00");
        assert_eq!(msg.id, "ATXid_1");
        assert!(msg.is_complete());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let msg = InboundMessage::parse(b"from=254700000000").unwrap();
        assert_eq!(msg.text, "");
        assert_eq!(msg.to, "");
        assert!(!msg.is_complete());
        let empty = InboundMessage::parse(b"").unwrap();
        assert_eq!(empty, InboundMessage::default());
    }

    #[test]
    fn empty_values_count_as_missing() {
        let msg = InboundMessage::parse(b"from=&text=hello").unwrap();
        assert!(!msg.is_complete());
    }

    #[test]
    fn first_repeated_value_wins() {
        let msg = InboundMessage::parse(b"from=1&from=2&text=a").unwrap();
        assert_eq!(msg.from, "1");
    }
}
