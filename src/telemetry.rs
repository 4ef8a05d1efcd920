//! Logging setup
//!
//! Installs the `tracing` subscriber and turns broker lifecycle events into
//! log lines.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::broker::{BrokerEvent, EventBus};
use crate::config::LoggingConfig;

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level. Calling this twice is an error
/// from `tracing-subscriber`, reported rather than panicking.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("fieldlink={},tower_http=info", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}

/// Spawn a task that logs every [`BrokerEvent`]
///
/// The task ends once every sender of the bus is gone.
pub fn spawn_event_logger(events: &EventBus) -> JoinHandle<()> {
    let mut rx = events.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind broker events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &BrokerEvent) {
    match event {
        BrokerEvent::Connected {
            session_id,
            client_id,
        } => {
            tracing::info!(session_id = %session_id, client_id = %client_id, "MQTT client connected");
        }
        BrokerEvent::Disconnected {
            session_id,
            client_id,
            reason,
        } => {
            tracing::info!(
                session_id = %session_id,
                client_id = client_id.as_deref().unwrap_or("-"),
                reason = %reason,
                "MQTT client disconnected"
            );
        }
        BrokerEvent::Subscribed {
            session_id,
            filters,
        } => {
            tracing::debug!(session_id = %session_id, filters = ?filters, "Subscribed");
        }
        BrokerEvent::Unsubscribed {
            session_id,
            filters,
        } => {
            tracing::debug!(session_id = %session_id, filters = ?filters, "Unsubscribed");
        }
        BrokerEvent::Published {
            topic,
            retain,
            delivered,
            dropped,
        } => {
            if *dropped > 0 {
                tracing::warn!(
                    topic = %topic,
                    delivered,
                    dropped,
                    "Published with dropped deliveries"
                );
            } else {
                tracing::trace!(topic = %topic, retain, delivered, "Published");
            }
        }
    }
}
