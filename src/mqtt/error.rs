//! MQTT protocol error types

use thiserror::Error;

/// A violation of the MQTT 3.1.1 wire format or session rules
///
/// Any of these closes the offending session only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Remaining length used more than four bytes
    #[error("Malformed remaining length")]
    MalformedRemainingLength,

    /// Packet larger than the configured limit
    #[error("Packet of {size} bytes exceeds limit of {max} bytes")]
    PacketTooLarge { size: usize, max: usize },

    /// Packet body ended before a field was complete
    #[error("Packet truncated while reading {0}")]
    Truncated(&'static str),

    /// Bytes left over after the last field of a packet
    #[error("Unexpected trailing bytes in {0}")]
    TrailingBytes(&'static str),

    /// Control packet type 0 or 15
    #[error("Unknown packet type {0}")]
    UnknownPacketType(u8),

    /// Fixed header flags do not match the packet type
    #[error("Invalid flags {flags:#06b} for {packet}")]
    InvalidFlags { packet: &'static str, flags: u8 },

    /// CONNECT flags are inconsistent
    #[error("Malformed CONNECT flags: {0}")]
    MalformedConnectFlags(&'static str),

    /// Protocol name is neither `MQTT` nor `MQIsdp`
    #[error("Invalid protocol name: {0}")]
    InvalidProtocolName(String),

    /// String field is not valid UTF-8
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    /// String field longer than 65535 bytes
    #[error("String field of {0} bytes is too long")]
    StringTooLong(usize),

    /// QoS 2 or the reserved value 3
    #[error("Unsupported QoS {0}")]
    UnsupportedQos(u8),

    /// CONNACK return code outside 0..=5
    #[error("Invalid CONNACK return code {0}")]
    InvalidReturnCode(u8),

    /// Packet types outside the supported subset (the QoS 2 flow)
    #[error("Unsupported packet: {0}")]
    UnsupportedPacket(&'static str),

    /// Packet identifier of zero where one is required
    #[error("Packet identifier must be non-zero")]
    ZeroPacketId,

    /// SUBSCRIBE or UNSUBSCRIBE without any filters
    #[error("{0} carries no topic filters")]
    EmptyFilterList(&'static str),

    /// Topic name is empty or contains wildcards or NUL
    #[error("Invalid topic name: {0:?}")]
    InvalidTopicName(String),

    /// Topic filter uses wildcards incorrectly
    #[error("Invalid topic filter: {0:?}")]
    InvalidTopicFilter(String),

    /// Packet not allowed in the current session state
    #[error("Unexpected {packet} while {state}")]
    UnexpectedPacket {
        packet: &'static str,
        state: &'static str,
    },
}

/// Result type alias for codec operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
