//! Session state machine
//!
//! [`SessionState::on_packet`] is a pure transition: given the current state
//! and an inbound packet it returns the next state and the [`Action`] the
//! session task must carry out. All I/O lives in the task.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::broker::validate_topic_name;
use crate::mqtt::{
    Connect, ConnectReturnCode, LastWill, Packet, ProtocolError, Publish, Subscribe, Unsubscribe,
    PROTOCOL_LEVEL_V31, PROTOCOL_LEVEL_V311,
};
use crate::transport::TransportError;

const SUPPORTED_PROTOCOL_LEVELS: [u8; 2] = [PROTOCOL_LEVEL_V31, PROTOCOL_LEVEL_V311];

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CloseReason {
    /// Client sent DISCONNECT
    ClientDisconnect,
    /// Transport stream ended
    TransportClosed,
    TransportError(String),
    ProtocolViolation(String),
    KeepAliveTimeout,
    /// Another connection claimed the same client id
    Takeover,
    /// CONNECT answered with a non-zero return code
    ConnectRefused(ConnectReturnCode),
}

impl CloseReason {
    /// Whether a stored last will should be published for this close
    pub fn publishes_will(&self) -> bool {
        !matches!(self, CloseReason::ClientDisconnect | CloseReason::Takeover)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ClientDisconnect => write!(f, "client disconnected"),
            CloseReason::TransportClosed => write!(f, "transport closed"),
            CloseReason::TransportError(e) => write!(f, "transport error: {e}"),
            CloseReason::ProtocolViolation(e) => write!(f, "protocol violation: {e}"),
            CloseReason::KeepAliveTimeout => write!(f, "keep-alive timeout"),
            CloseReason::Takeover => write!(f, "client id taken over"),
            CloseReason::ConnectRefused(code) => write!(f, "connect refused: {code}"),
        }
    }
}

impl From<TransportError> for CloseReason {
    fn from(err: TransportError) -> Self {
        CloseReason::TransportError(err.to_string())
    }
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingConnect,
    Connected { client_id: String },
    Closed(CloseReason),
}

/// Work the session task performs after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Register the client and answer CONNACK accepted
    Accept {
        client_id: String,
        will: Option<LastWill>,
    },
    /// Answer CONNACK with this code, then close
    Refuse(ConnectReturnCode),
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),
    Publish(Publish),
    /// Answer PINGRESP
    Ping,
    /// Clean close; the will is discarded
    Disconnect,
    /// Nothing to do
    Ignore,
    /// Close for a protocol violation
    Violation(ProtocolError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::AwaitingConnect => "awaiting CONNECT",
            SessionState::Connected { .. } => "connected",
            SessionState::Closed(_) => "closed",
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        match self {
            SessionState::Connected { client_id } => Some(client_id),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed(_))
    }

    /// Move to `Closed`, keeping the first reason if already closed
    pub fn close(self, reason: CloseReason) -> SessionState {
        match self {
            SessionState::Closed(previous) => SessionState::Closed(previous),
            _ => SessionState::Closed(reason),
        }
    }

    /// Transition on an inbound packet
    pub fn on_packet(self, packet: Packet) -> (SessionState, Action) {
        match self {
            SessionState::Closed(reason) => (SessionState::Closed(reason), Action::Ignore),

            SessionState::AwaitingConnect => match packet {
                Packet::Connect(connect) => accept_connect(connect),
                other => violation(ProtocolError::UnexpectedPacket {
                    packet: other.name(),
                    state: "awaiting CONNECT",
                }),
            },

            SessionState::Connected { client_id } => {
                let connected = SessionState::Connected { client_id };
                match packet {
                    Packet::Subscribe(subscribe) => (connected, Action::Subscribe(subscribe)),
                    Packet::Unsubscribe(unsubscribe) => {
                        (connected, Action::Unsubscribe(unsubscribe))
                    }
                    Packet::Publish(publish) => (connected, Action::Publish(publish)),
                    // no retry bookkeeping for outbound QoS 1
                    Packet::PubAck(_) => (connected, Action::Ignore),
                    Packet::PingReq => (connected, Action::Ping),
                    Packet::Disconnect => (
                        SessionState::Closed(CloseReason::ClientDisconnect),
                        Action::Disconnect,
                    ),
                    other => violation(ProtocolError::UnexpectedPacket {
                        packet: other.name(),
                        state: "connected",
                    }),
                }
            }
        }
    }
}

fn accept_connect(connect: Connect) -> (SessionState, Action) {
    if !SUPPORTED_PROTOCOL_LEVELS.contains(&connect.protocol_level) {
        return refuse(ConnectReturnCode::UnacceptableProtocolVersion);
    }
    if connect.client_id.is_empty() && !connect.clean_session {
        return refuse(ConnectReturnCode::IdentifierRejected);
    }
    if let Some(will) = &connect.will {
        if let Err(err) = validate_topic_name(&will.topic) {
            return violation(err);
        }
    }

    let client_id = if connect.client_id.is_empty() {
        generate_client_id()
    } else {
        connect.client_id
    };

    (
        SessionState::Connected {
            client_id: client_id.clone(),
        },
        Action::Accept {
            client_id,
            will: connect.will,
        },
    )
}

fn refuse(code: ConnectReturnCode) -> (SessionState, Action) {
    (
        SessionState::Closed(CloseReason::ConnectRefused(code)),
        Action::Refuse(code),
    )
}

fn violation(err: ProtocolError) -> (SessionState, Action) {
    (
        SessionState::Closed(CloseReason::ProtocolViolation(err.to_string())),
        Action::Violation(err),
    )
}

fn generate_client_id() -> String {
    format!("fieldlink-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::{QoS, SubscribeFilter};
    use bytes::Bytes;

    fn connected() -> SessionState {
        SessionState::Connected {
            client_id: "dev1".to_string(),
        }
    }

    #[test]
    fn test_connect_accepted() {
        let (state, action) = SessionState::AwaitingConnect.on_packet(Packet::Connect(Connect::new("dev1")));

        assert_eq!(state, connected());
        assert_eq!(
            action,
            Action::Accept {
                client_id: "dev1".to_string(),
                will: None
            }
        );
    }

    #[test]
    fn test_unsupported_protocol_level_refused() {
        let connect = Connect {
            protocol_level: 5,
            ..Connect::new("dev1")
        };
        let (state, action) = SessionState::AwaitingConnect.on_packet(Packet::Connect(connect));

        assert_eq!(
            action,
            Action::Refuse(ConnectReturnCode::UnacceptableProtocolVersion)
        );
        assert!(state.is_closed());
    }

    #[test]
    fn test_empty_client_id() {
        let persistent = Connect {
            clean_session: false,
            ..Connect::new("")
        };
        let (_, action) = SessionState::AwaitingConnect.on_packet(Packet::Connect(persistent));
        assert_eq!(action, Action::Refuse(ConnectReturnCode::IdentifierRejected));

        let (state, action) = SessionState::AwaitingConnect.on_packet(Packet::Connect(Connect::new("")));
        let client_id = state.client_id().unwrap().to_string();
        assert!(client_id.starts_with("fieldlink-"));
        assert!(matches!(action, Action::Accept { client_id: id, .. } if id == client_id));
    }

    #[test]
    fn test_will_topic_validated() {
        let connect = Connect {
            will: Some(LastWill {
                topic: "devices/#".to_string(),
                payload: Bytes::from_static(b"gone"),
                qos: QoS::AtMostOnce,
                retain: false,
            }),
            ..Connect::new("dev1")
        };
        let (state, action) = SessionState::AwaitingConnect.on_packet(Packet::Connect(connect));
        assert!(state.is_closed());
        assert!(matches!(action, Action::Violation(ProtocolError::InvalidTopicName(_))));
    }

    #[test]
    fn test_packet_before_connect_is_violation() {
        let (state, action) = SessionState::AwaitingConnect.on_packet(Packet::PingReq);

        assert!(matches!(
            state,
            SessionState::Closed(CloseReason::ProtocolViolation(_))
        ));
        assert_eq!(
            action,
            Action::Violation(ProtocolError::UnexpectedPacket {
                packet: "PINGREQ",
                state: "awaiting CONNECT"
            })
        );
    }

    #[test]
    fn test_second_connect_is_violation() {
        let (state, action) = connected().on_packet(Packet::Connect(Connect::new("dev1")));
        assert!(state.is_closed());
        assert!(matches!(action, Action::Violation(_)));
    }

    #[test]
    fn test_server_packets_from_client_are_violations() {
        for packet in [Packet::PingResp, Packet::UnsubAck(1)] {
            let (state, _) = connected().on_packet(packet);
            assert!(state.is_closed());
        }
    }

    #[test]
    fn test_connected_transitions() {
        let subscribe = Subscribe {
            packet_id: 1,
            filters: vec![SubscribeFilter {
                filter: "devices/+".to_string(),
                requested_qos: 1,
            }],
        };
        let (state, action) = connected().on_packet(Packet::Subscribe(subscribe.clone()));
        assert_eq!(state, connected());
        assert_eq!(action, Action::Subscribe(subscribe));

        let (state, action) = connected().on_packet(Packet::PubAck(9));
        assert_eq!(state, connected());
        assert_eq!(action, Action::Ignore);

        let (_, action) = connected().on_packet(Packet::PingReq);
        assert_eq!(action, Action::Ping);
    }

    #[test]
    fn test_disconnect_closes_cleanly() {
        let (state, action) = connected().on_packet(Packet::Disconnect);
        assert_eq!(state, SessionState::Closed(CloseReason::ClientDisconnect));
        assert_eq!(action, Action::Disconnect);
    }

    #[test]
    fn test_closed_ignores_everything() {
        let closed = SessionState::Closed(CloseReason::KeepAliveTimeout);
        let (state, action) = closed.on_packet(Packet::PingReq);
        assert_eq!(state, SessionState::Closed(CloseReason::KeepAliveTimeout));
        assert_eq!(action, Action::Ignore);

        assert_eq!(
            state.close(CloseReason::Takeover),
            SessionState::Closed(CloseReason::KeepAliveTimeout)
        );
    }

    #[test]
    fn test_will_policy() {
        assert!(!CloseReason::ClientDisconnect.publishes_will());
        assert!(!CloseReason::Takeover.publishes_will());
        assert!(CloseReason::KeepAliveTimeout.publishes_will());
        assert!(CloseReason::TransportClosed.publishes_will());
    }
}
