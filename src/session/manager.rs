//! Broker Session Manager
//!
//! Runs one session per transport connection. The transport hands over a
//! byte source and a byte sink; the session task frames MQTT packets out of
//! the source, drives [`SessionState`], talks to the [`TopicRouter`] and
//! writes replies and deliveries to the sink.

use bytes::{Bytes, BytesMut};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use super::state::{Action, CloseReason, SessionState};
use crate::broker::{BrokerEvent, Delivery, EventBus, Message, SessionId, TopicRouter};
use crate::mqtt::{
    ConnAck, ConnectReturnCode, LastWill, MqttCodec, Packet, Publish, QoS, SubAck, SubAckCode,
    Subscribe, Unsubscribe, DEFAULT_MAX_PACKET_SIZE,
};
use crate::transport::TransportError;

/// Configuration for broker sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle interval after which a silent session is closed
    pub keep_alive: Duration,
    /// Upper bound on a single write to the transport
    pub write_timeout: Duration,
    /// Capacity of each session's outbound delivery queue
    pub outbound_capacity: usize,
    pub max_packet_size: usize,
    /// Concurrent sessions accepted before upgrades are refused
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keep_alive: Duration::from_secs(90),
            write_timeout: Duration::from_secs(5),
            outbound_capacity: 256,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_sessions: 1000,
        }
    }
}

/// Live session registered under a client id
struct LiveSession {
    session_id: SessionId,
    kick: Arc<Notify>,
}

/// Owns every broker session
pub struct SessionManager {
    router: Arc<TopicRouter>,
    config: SessionConfig,
    /// Client id → live session, for takeover
    live: Mutex<HashMap<String, LiveSession>>,
    active: Arc<AtomicUsize>,
}

impl SessionManager {
    pub fn new(router: Arc<TopicRouter>, config: SessionConfig) -> Self {
        Self {
            router,
            config,
            live: Mutex::new(HashMap::new()),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn router(&self) -> &Arc<TopicRouter> {
        &self.router
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn events(&self) -> &EventBus {
        self.router.events()
    }

    /// Sessions currently running, connected or not
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn at_capacity(&self) -> bool {
        self.active_sessions() >= self.config.max_sessions
    }

    /// Claim a session slot if fewer than `max_sessions` are taken
    ///
    /// The slot is released when the returned [`SessionSlot`] drops.
    pub fn try_reserve(&self) -> Option<SessionSlot> {
        let max = self.config.max_sessions;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| SessionSlot {
                active: Arc::clone(&self.active),
            })
    }

    /// Run a session to completion over the given transport halves
    ///
    /// Returns once the session is closed and torn down: detached from the
    /// router, last will handled, sink closed and the disconnect event
    /// emitted.
    pub async fn run<S, K>(&self, source: S, sink: K) -> CloseReason
    where
        S: Stream<Item = Result<Bytes, TransportError>>,
        K: Sink<Bytes, Error = TransportError>,
    {
        self.active.fetch_add(1, Ordering::AcqRel);
        let slot = SessionSlot {
            active: Arc::clone(&self.active),
        };
        self.run_in(slot, source, sink).await
    }

    /// Run a session in a slot already claimed with [`try_reserve`](Self::try_reserve)
    pub async fn run_in<S, K>(&self, slot: SessionSlot, source: S, sink: K) -> CloseReason
    where
        S: Stream<Item = Result<Bytes, TransportError>>,
        K: Sink<Bytes, Error = TransportError>,
    {
        let mut task = SessionTask::new(self, slot, Box::pin(source), Box::pin(sink));
        tracing::debug!(session_id = %task.id, "Session started");

        let reason = task.drive().await;
        task.teardown(&reason).await;

        tracing::debug!(session_id = %task.id, reason = %reason, "Session ended");
        reason
    }
}

/// A claimed place among the running sessions
#[derive(Debug)]
pub struct SessionSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

struct SessionTask<'a, S, K> {
    manager: &'a SessionManager,
    id: SessionId,
    state: SessionState,
    client_id: Option<String>,
    attached: bool,
    will: Option<LastWill>,
    codec: MqttCodec,
    read_buf: BytesMut,
    source: Pin<Box<S>>,
    sink: Pin<Box<K>>,
    outbound_tx: mpsc::Sender<Delivery>,
    outbound_rx: mpsc::Receiver<Delivery>,
    kick: Arc<Notify>,
    next_packet_id: u16,
    deadline: Instant,
    _slot: SessionSlot,
}

impl<'a, S, K> SessionTask<'a, S, K>
where
    S: Stream<Item = Result<Bytes, TransportError>>,
    K: Sink<Bytes, Error = TransportError>,
{
    fn new(
        manager: &'a SessionManager,
        slot: SessionSlot,
        source: Pin<Box<S>>,
        sink: Pin<Box<K>>,
    ) -> Self {
        let config = &manager.config;
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));

        Self {
            manager,
            id: Uuid::new_v4().to_string(),
            state: SessionState::AwaitingConnect,
            client_id: None,
            attached: false,
            will: None,
            codec: MqttCodec::new(config.max_packet_size),
            read_buf: BytesMut::new(),
            source,
            sink,
            outbound_tx,
            outbound_rx,
            kick: Arc::new(Notify::new()),
            next_packet_id: 1,
            deadline: Instant::now() + config.keep_alive,
            _slot: slot,
        }
    }

    async fn drive(&mut self) -> CloseReason {
        loop {
            tokio::select! {
                _ = self.kick.notified() => return CloseReason::Takeover,

                frame = self.source.next() => match frame {
                    Some(Ok(chunk)) => {
                        self.deadline = Instant::now() + self.manager.config.keep_alive;
                        self.read_buf.extend_from_slice(&chunk);
                        if let Err(reason) = self.process_inbound().await {
                            return reason;
                        }
                    }
                    Some(Err(err)) => return err.into(),
                    None => return CloseReason::TransportClosed,
                },

                Some(delivery) = self.outbound_rx.recv() => {
                    if let Err(reason) = self.deliver(delivery).await {
                        return reason;
                    }
                }

                _ = tokio::time::sleep_until(self.deadline) => return CloseReason::KeepAliveTimeout,
            }
        }
    }

    /// Decode and handle every complete packet in the read buffer
    async fn process_inbound(&mut self) -> Result<(), CloseReason> {
        loop {
            let packet = match self.codec.decode(&mut self.read_buf) {
                Ok(Some(packet)) => packet,
                Ok(None) => return Ok(()),
                Err(err) => return Err(CloseReason::ProtocolViolation(err.to_string())),
            };

            tracing::trace!(session_id = %self.id, packet = packet.name(), "Packet received");

            let state = std::mem::replace(&mut self.state, SessionState::AwaitingConnect);
            let (next, action) = state.on_packet(packet);
            self.state = next;

            self.apply(action).await?;
        }
    }

    async fn apply(&mut self, action: Action) -> Result<(), CloseReason> {
        match action {
            Action::Accept { client_id, will } => self.accept(client_id, will).await,
            Action::Refuse(code) => {
                self.write(&Packet::ConnAck(ConnAck {
                    session_present: false,
                    code,
                }))
                .await?;
                Err(CloseReason::ConnectRefused(code))
            }
            Action::Subscribe(subscribe) => self.subscribe(subscribe).await,
            Action::Unsubscribe(unsubscribe) => self.unsubscribe(unsubscribe).await,
            Action::Publish(publish) => self.publish(publish).await,
            Action::Ping => self.write(&Packet::PingResp).await,
            Action::Disconnect => {
                self.will = None;
                Err(CloseReason::ClientDisconnect)
            }
            Action::Ignore => Ok(()),
            Action::Violation(err) => Err(CloseReason::ProtocolViolation(err.to_string())),
        }
    }

    async fn accept(&mut self, client_id: String, will: Option<LastWill>) -> Result<(), CloseReason> {
        let previous = self.manager.live.lock().await.insert(
            client_id.clone(),
            LiveSession {
                session_id: self.id.clone(),
                kick: Arc::clone(&self.kick),
            },
        );
        if let Some(previous) = previous {
            tracing::debug!(
                client_id = %client_id,
                previous_session = %previous.session_id,
                "Client id taken over"
            );
            previous.kick.notify_one();
        }

        self.manager
            .router
            .attach(&self.id, self.outbound_tx.clone())
            .await;
        self.attached = true;
        self.will = will;
        self.client_id = Some(client_id.clone());

        self.write(&Packet::ConnAck(ConnAck {
            session_present: false,
            code: ConnectReturnCode::Accepted,
        }))
        .await?;

        self.manager.events().emit(BrokerEvent::Connected {
            session_id: self.id.clone(),
            client_id,
        });
        Ok(())
    }

    async fn subscribe(&mut self, subscribe: Subscribe) -> Result<(), CloseReason> {
        let mut codes = Vec::with_capacity(subscribe.filters.len());
        let mut accepted = Vec::new();
        let mut replay = Vec::new();

        for entry in subscribe.filters {
            let qos = QoS::granted_for(entry.requested_qos);
            match self.manager.router.subscribe(&self.id, &entry.filter, qos).await {
                Ok(outcome) => {
                    codes.push(SubAckCode::Granted(outcome.granted));
                    accepted.push(entry.filter);
                    replay.extend(outcome.retained);
                }
                Err(err) => {
                    tracing::debug!(
                        session_id = %self.id,
                        filter = %entry.filter,
                        error = %err,
                        "Subscription refused"
                    );
                    codes.push(SubAckCode::Failure);
                }
            }
        }

        self.write(&Packet::SubAck(SubAck {
            packet_id: subscribe.packet_id,
            codes,
        }))
        .await?;

        for delivery in replay {
            self.deliver(delivery).await?;
        }

        if !accepted.is_empty() {
            self.manager.events().emit(BrokerEvent::Subscribed {
                session_id: self.id.clone(),
                filters: accepted,
            });
        }
        Ok(())
    }

    async fn unsubscribe(&mut self, unsubscribe: Unsubscribe) -> Result<(), CloseReason> {
        let mut removed = Vec::new();
        for filter in unsubscribe.filters {
            if self.manager.router.unsubscribe(&self.id, &filter).await {
                removed.push(filter);
            }
        }

        self.write(&Packet::UnsubAck(unsubscribe.packet_id)).await?;

        if !removed.is_empty() {
            self.manager.events().emit(BrokerEvent::Unsubscribed {
                session_id: self.id.clone(),
                filters: removed,
            });
        }
        Ok(())
    }

    async fn publish(&mut self, publish: Publish) -> Result<(), CloseReason> {
        let message = Message {
            topic: publish.topic,
            payload: publish.payload,
            qos: publish.qos,
            retain: publish.retain,
        };

        self.manager
            .router
            .publish(message)
            .await
            .map_err(|err| CloseReason::ProtocolViolation(err.to_string()))?;

        if let Some(packet_id) = publish.packet_id {
            self.write(&Packet::PubAck(packet_id)).await?;
        }
        Ok(())
    }

    async fn deliver(&mut self, delivery: Delivery) -> Result<(), CloseReason> {
        let packet_id = match delivery.qos {
            QoS::AtMostOnce => None,
            QoS::AtLeastOnce => Some(self.next_packet_id()),
        };

        let publish = Publish {
            dup: false,
            qos: delivery.qos,
            retain: delivery.retained,
            topic: delivery.message.topic.clone(),
            packet_id,
            payload: delivery.message.payload.clone(),
        };
        self.write(&Packet::Publish(publish)).await
    }

    fn next_packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = id.checked_add(1).unwrap_or(1);
        id
    }

    async fn write(&mut self, packet: &Packet) -> Result<(), CloseReason> {
        let mut buf = BytesMut::new();
        self.codec
            .encode(packet, &mut buf)
            .map_err(|err| CloseReason::ProtocolViolation(err.to_string()))?;

        let write_timeout = self.manager.config.write_timeout;
        match tokio::time::timeout(write_timeout, self.sink.send(buf.freeze())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(TransportError::WriteTimeout(write_timeout).into()),
        }
    }

    async fn teardown(&mut self, reason: &CloseReason) {
        let state = std::mem::replace(&mut self.state, SessionState::AwaitingConnect);
        self.state = state.close(reason.clone());

        if self.attached {
            self.manager.router.detach(&self.id).await;
        }

        if let Some(client_id) = &self.client_id {
            let mut live = self.manager.live.lock().await;
            if live
                .get(client_id)
                .is_some_and(|entry| entry.session_id == self.id)
            {
                live.remove(client_id);
            }
        }

        if let Some(will) = self.will.take() {
            if reason.publishes_will() {
                let message = Message {
                    topic: will.topic,
                    payload: will.payload,
                    qos: will.qos,
                    retain: will.retain,
                };
                if let Err(err) = self.manager.router.publish(message).await {
                    tracing::debug!(session_id = %self.id, error = %err, "Last will not published");
                }
            }
        }

        let write_timeout = self.manager.config.write_timeout;
        if let Ok(Err(err)) = tokio::time::timeout(write_timeout, self.sink.close()).await {
            tracing::trace!(session_id = %self.id, error = %err, "Sink close failed");
        }

        self.manager.events().emit(BrokerEvent::Disconnected {
            session_id: self.id.clone(),
            client_id: self.client_id.clone(),
            reason: reason.clone(),
        });
    }
}
