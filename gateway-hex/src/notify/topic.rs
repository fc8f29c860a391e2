//! Topics and realtime wire messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NotifyError;

/// Event names used on the realtime surface.
pub mod events {
    pub const SUBSCRIBE_PAYMENT: &str = "subscribe_payment";
    pub const UNSUBSCRIBE_PAYMENT: &str = "unsubscribe_payment";
    pub const PAYMENT_SUBSCRIBED: &str = "payment_subscribed";
    pub const PAYMENT_UNSUBSCRIBED: &str = "payment_unsubscribed";
    pub const PAYMENT_UPDATE: &str = "payment_update";
    pub const ERROR: &str = "error";
}

/// A subscription channel, named `payment_{payment_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    const PAYMENT_PREFIX: &'static str = "payment_";

    /// Topic carrying updates for one payment. Surrounding whitespace in the
    /// id is ignored.
    pub fn payment(payment_id: &str) -> Result<Self, NotifyError> {
        let payment_id = payment_id.trim();
        if payment_id.is_empty() {
            return Err(NotifyError::InvalidTopic("payment_id is required".into()));
        }
        Ok(Self(format!("{}{}", Self::PAYMENT_PREFIX, payment_id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized payment id this topic was built from.
    pub fn payment_id(&self) -> &str {
        self.0.strip_prefix(Self::PAYMENT_PREFIX).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable event addressed to every subscriber of `topic`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub topic: Topic,
    pub event_name: String,
    pub payload: Value,
}

impl DomainEvent {
    /// `payment_update` for the given payment.
    pub fn payment_update(
        payment_id: &str,
        status: &str,
        details: Value,
    ) -> Result<Self, NotifyError> {
        let topic = Topic::payment(payment_id)?;
        let payload = serde_json::json!({
            "payment_id": topic.payment_id(),
            "status": status,
            "details": details,
        });
        Ok(Self {
            topic,
            event_name: events::PAYMENT_UPDATE.to_string(),
            payload,
        })
    }
}

/// Frame sent from the server to one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub event: String,
    pub data: Value,
}

impl ServerMessage {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Frame received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, NotifyError> {
        serde_json::from_str(text).map_err(|e| NotifyError::InvalidMessage(e.to_string()))
    }

    /// The `payment_id` field of the payload, or `""` when absent.
    pub fn payment_id(&self) -> &str {
        self.data
            .get("payment_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_topic_name() {
        assert_eq!(Topic::payment("pay-1").unwrap().as_str(), "payment_pay-1");
    }

    #[test]
    fn test_empty_payment_id_rejected() {
        let err = Topic::payment("  ").unwrap_err();
        assert_eq!(err.to_string(), "payment_id is required");
    }

    #[test]
    fn test_payment_update_payload() {
        let event = DomainEvent::payment_update("pay-1", "SUCCEEDED", json!({"id": "pay-1"}))
            .unwrap();

        assert_eq!(event.topic.as_str(), "payment_pay-1");
        assert_eq!(event.event_name, "payment_update");
        assert_eq!(event.payload["payment_id"], "pay-1");
        assert_eq!(event.payload["status"], "SUCCEEDED");
        assert_eq!(event.payload["details"]["id"], "pay-1");
    }

    #[test]
    fn test_padded_id_is_normalized_everywhere() {
        let event = DomainEvent::payment_update(" pay-1 ", "PENDING", json!({})).unwrap();

        assert_eq!(event.topic.as_str(), "payment_pay-1");
        assert_eq!(event.topic.payment_id(), "pay-1");
        assert_eq!(event.payload["payment_id"], "pay-1");
    }

    #[test]
    fn test_client_frame_without_data() {
        let frame = ClientFrame::parse(r#"{"event":"subscribe_payment"}"#).unwrap();
        assert_eq!(frame.event, "subscribe_payment");
        assert_eq!(frame.payment_id(), "");
    }

    #[test]
    fn test_client_frame_garbage() {
        assert!(matches!(
            ClientFrame::parse("not json"),
            Err(NotifyError::InvalidMessage(_))
        ));
    }
}
