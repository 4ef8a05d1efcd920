//! Broker message types

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use crate::mqtt::QoS;

/// An application message flowing through the broker
///
/// Immutable once published; shared between recipients behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

impl Message {
    /// QoS 0, non-retained message
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }

    /// Message whose payload is the JSON encoding of `value`
    pub fn json<T: Serialize>(topic: impl Into<String>, value: &T) -> serde_json::Result<Self> {
        Ok(Self::new(topic, serde_json::to_vec(value)?))
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }
}

/// A message queued for one session
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: Arc<Message>,
    /// Effective QoS: the subscription's granted QoS capped by the message QoS
    pub qos: QoS,
    /// Set when replaying a retained message to a new subscription
    pub retained: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let message = Message::new("devices/status", "online")
            .qos(QoS::AtLeastOnce)
            .retain(true);

        assert_eq!(message.topic, "devices/status");
        assert_eq!(&message.payload[..], b"online");
        assert_eq!(message.qos, QoS::AtLeastOnce);
        assert!(message.retain);
    }

    #[test]
    fn test_json_payload() {
        let message = Message::json("devices/command", &json!({"action": "reboot"})).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&message.payload).unwrap();
        assert_eq!(decoded["action"], "reboot");
        assert_eq!(message.qos, QoS::AtMostOnce);
    }
}
