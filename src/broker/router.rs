//! Topic Router
//!
//! Owns the subscription table and the retained-message store. Sessions
//! attach a bounded outbound queue; publishing matches the topic against
//! every session's filters and `try_send`s one [`Delivery`] per matching
//! session.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use super::error::{BrokerError, BrokerResult, DeliveryFailure};
use super::events::{BrokerEvent, EventBus};
use super::message::{Delivery, Message};
use super::topic::{topic_matches, validate_topic_filter, validate_topic_name};
use crate::mqtt::QoS;

/// Identifier of a broker session
pub type SessionId = String;

/// Configuration for the topic router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum number of topics holding a retained message
    pub max_retained: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_retained: 10_000,
        }
    }
}

/// Result of a single subscribe call
#[derive(Debug, Clone)]
pub struct SubscribeOutcome {
    pub granted: QoS,
    /// False when the session already held this filter
    pub new: bool,
    /// Retained messages matching a new filter, for the session to write
    /// itself after the SUBACK
    pub retained: Vec<Delivery>,
}

struct Subscriber {
    outbound: mpsc::Sender<Delivery>,
    /// Topic filter → granted QoS
    filters: HashMap<String, QoS>,
}

#[derive(Default)]
struct RouterState {
    sessions: HashMap<SessionId, Subscriber>,
    retained: HashMap<String, Arc<Message>>,
}

/// Routes published messages to subscribed sessions
pub struct TopicRouter {
    state: RwLock<RouterState>,
    events: Arc<EventBus>,
    config: RouterConfig,
}

impl TopicRouter {
    pub fn new(config: RouterConfig, events: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(RouterState::default()),
            events,
            config,
        }
    }

    /// Lifecycle event bus shared with the session manager
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Register the outbound queue of a connected session
    ///
    /// Re-attaching an id replaces its queue and clears its filters.
    pub async fn attach(&self, session_id: &str, outbound: mpsc::Sender<Delivery>) {
        self.state.write().await.sessions.insert(
            session_id.to_string(),
            Subscriber {
                outbound,
                filters: HashMap::new(),
            },
        );
        tracing::debug!(session_id = %session_id, "Session attached to router");
    }

    /// Remove a session, its filters and its outbound queue
    ///
    /// Returns the filters the session held.
    pub async fn detach(&self, session_id: &str) -> Vec<String> {
        let removed = self.state.write().await.sessions.remove(session_id);
        let filters: Vec<String> = removed
            .map(|sub| sub.filters.into_keys().collect())
            .unwrap_or_default();

        tracing::debug!(
            session_id = %session_id,
            filters = filters.len(),
            "Session detached from router"
        );
        filters
    }

    /// Subscribe a session to a topic filter
    ///
    /// Subscribing to a filter the session already holds only updates the
    /// granted QoS. A new subscription gets every matching retained message
    /// back in the outcome, once. They bypass the outbound queue so a large
    /// replay is never cut short by the queue bound.
    pub async fn subscribe(
        &self,
        session_id: &str,
        filter: &str,
        qos: QoS,
    ) -> BrokerResult<SubscribeOutcome> {
        validate_topic_filter(filter)?;

        let mut state = self.state.write().await;
        let RouterState { sessions, retained } = &mut *state;

        let subscriber = sessions
            .get_mut(session_id)
            .ok_or_else(|| BrokerError::SessionNotAttached(session_id.to_string()))?;

        let new = subscriber.filters.insert(filter.to_string(), qos).is_none();

        let replay: Vec<Delivery> = if new {
            retained
                .values()
                .filter(|m| topic_matches(filter, &m.topic))
                .map(|message| Delivery {
                    message: Arc::clone(message),
                    qos: qos.min(message.qos),
                    retained: true,
                })
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            session_id = %session_id,
            filter = %filter,
            qos = qos.as_u8(),
            new,
            retained = replay.len(),
            "Subscribed"
        );

        Ok(SubscribeOutcome {
            granted: qos,
            new,
            retained: replay,
        })
    }

    /// Remove one filter from a session; false when it was not held
    pub async fn unsubscribe(&self, session_id: &str, filter: &str) -> bool {
        let mut state = self.state.write().await;
        let removed = state
            .sessions
            .get_mut(session_id)
            .map(|sub| sub.filters.remove(filter).is_some())
            .unwrap_or(false);

        tracing::debug!(session_id = %session_id, filter = %filter, removed, "Unsubscribed");
        removed
    }

    /// Remove every filter a session holds, keeping it attached
    pub async fn unsubscribe_all(&self, session_id: &str) -> Vec<String> {
        let mut state = self.state.write().await;
        state
            .sessions
            .get_mut(session_id)
            .map(|sub| sub.filters.drain().map(|(filter, _)| filter).collect())
            .unwrap_or_default()
    }

    /// Publish a message to every matching session
    ///
    /// Returns how many sessions the message was queued to. Each session
    /// receives it at most once, at the highest QoS granted among its
    /// matching filters, capped by the message QoS. Full or closed queues
    /// drop the delivery.
    pub async fn publish(&self, message: Message) -> BrokerResult<usize> {
        validate_topic_name(&message.topic)?;
        let message = Arc::new(message);

        let (delivered, dropped) = if message.retain {
            let mut state = self.state.write().await;
            self.store_retained(&mut state.retained, &message);
            fan_out(&state.sessions, &message)
        } else {
            let state = self.state.read().await;
            fan_out(&state.sessions, &message)
        };

        self.events.emit(BrokerEvent::Published {
            topic: message.topic.clone(),
            retain: message.retain,
            delivered,
            dropped,
        });

        Ok(delivered)
    }

    fn store_retained(&self, retained: &mut HashMap<String, Arc<Message>>, message: &Arc<Message>) {
        if message.payload.is_empty() {
            retained.remove(&message.topic);
            return;
        }

        if !retained.contains_key(&message.topic) && retained.len() >= self.config.max_retained {
            tracing::warn!(
                topic = %message.topic,
                max_retained = self.config.max_retained,
                "Retained store full, message not retained"
            );
            return;
        }

        retained.insert(message.topic.clone(), Arc::clone(message));
    }

    /// Retained message currently held for an exact topic
    pub async fn retained(&self, topic: &str) -> Option<Arc<Message>> {
        self.state.read().await.retained.get(topic).cloned()
    }

    pub async fn retained_count(&self) -> usize {
        self.state.read().await.retained.len()
    }

    /// Number of attached sessions
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Filters held by a session, sorted
    pub async fn subscriptions(&self, session_id: &str) -> Vec<String> {
        let state = self.state.read().await;
        let mut filters: Vec<String> = state
            .sessions
            .get(session_id)
            .map(|sub| sub.filters.keys().cloned().collect())
            .unwrap_or_default();
        filters.sort();
        filters
    }
}

/// Queue a message to every session with a matching filter
///
/// Returns (delivered, dropped).
fn fan_out(sessions: &HashMap<SessionId, Subscriber>, message: &Arc<Message>) -> (usize, usize) {
    let mut delivered = 0;
    let mut dropped = 0;

    for (session_id, subscriber) in sessions {
        let granted = subscriber
            .filters
            .iter()
            .filter(|(filter, _)| topic_matches(filter, &message.topic))
            .map(|(_, qos)| *qos)
            .max();

        let Some(granted) = granted else {
            continue;
        };

        let delivery = Delivery {
            message: Arc::clone(message),
            qos: granted.min(message.qos),
            retained: false,
        };

        match offer(session_id, &subscriber.outbound, delivery) {
            Ok(()) => delivered += 1,
            Err(_) => dropped += 1,
        }
    }

    tracing::trace!(
        topic = %message.topic,
        delivered,
        dropped,
        "Fan-out complete"
    );

    (delivered, dropped)
}

fn offer(
    session_id: &str,
    outbound: &mpsc::Sender<Delivery>,
    delivery: Delivery,
) -> Result<(), DeliveryFailure> {
    outbound.try_send(delivery).map_err(|err| {
        let (failure, delivery) = match err {
            TrySendError::Full(d) => (DeliveryFailure::QueueFull, d),
            TrySendError::Closed(d) => (DeliveryFailure::SessionGone, d),
        };
        tracing::warn!(
            session_id = %session_id,
            topic = %delivery.message.topic,
            error = %failure,
            "Delivery dropped"
        );
        failure
    })
}
