//! Broker lifecycle events
//!
//! The broker core never logs lifecycle itself. It emits [`BrokerEvent`]s on
//! a broadcast channel and whoever cares (the binary's event logger, tests)
//! subscribes.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::session::CloseReason;

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Something that happened to a session or a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrokerEvent {
    Connected {
        session_id: String,
        client_id: String,
    },
    Disconnected {
        session_id: String,
        client_id: Option<String>,
        reason: CloseReason,
    },
    Subscribed {
        session_id: String,
        filters: Vec<String>,
    },
    Unsubscribed {
        session_id: String,
        filters: Vec<String>,
    },
    Published {
        topic: String,
        retain: bool,
        delivered: usize,
        dropped: usize,
    },
}

/// Fan-out channel for [`BrokerEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BrokerEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event; silently dropped when nobody listens
    pub fn emit(&self, event: BrokerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BrokerEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
