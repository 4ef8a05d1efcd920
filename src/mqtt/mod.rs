//! MQTT 3.1.1 Wire Protocol
//!
//! - **packet**: Control packet types
//! - **codec**: Incremental decoder and encoder over `bytes` buffers
//! - **error**: [`ProtocolError`]
//!
//! # Framing
//!
//! ```text
//! ┌──────────────┬───────────────────┬──────────────────────────┐
//! │ type | flags │ remaining length  │ variable header + payload│
//! │   1 byte     │ 1-4 bytes (7 bit) │ remaining length bytes   │
//! └──────────────┴───────────────────┴──────────────────────────┘
//! ```

pub mod codec;
pub mod error;
pub mod packet;

pub use codec::{MqttCodec, DEFAULT_MAX_PACKET_SIZE};
pub use error::{ProtocolError, ProtocolResult};
pub use packet::{
    ConnAck, Connect, ConnectReturnCode, LastWill, Packet, Publish, QoS, SubAck, SubAckCode,
    Subscribe, SubscribeFilter, Unsubscribe, PROTOCOL_LEVEL_V31, PROTOCOL_LEVEL_V311,
};
