//! Broker error types

use thiserror::Error;

use crate::mqtt::ProtocolError;

/// Errors returned by the topic router
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Invalid topic name or filter
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Subscribe called for a session that never attached
    #[error("Session not attached: {0}")]
    SessionNotAttached(String),
}

/// Why a single delivery was dropped
///
/// Logged and counted by the router, never returned to a publisher.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    #[error("outbound queue full")]
    QueueFull,

    #[error("session gone")]
    SessionGone,
}

/// Result type alias for router operations
pub type BrokerResult<T> = Result<T, BrokerError>;
