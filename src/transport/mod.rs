//! Transport Bridge
//!
//! MQTT over WebSocket binary frames on a single upgrade path.
//!
//! ```text
//! GET /mqtt (no upgrade)   → 426 + hint
//! GET /mqtt (upgrade)      → 101, subprotocol "mqtt" → SessionManager::run
//! upgrade on another path  → 404, no handshake
//! at max sessions          → 503
//! ```
//!
//! Browser and Node clients connect with e.g. `mqtt.connect("ws://host:3000/mqtt")`.

mod bridge;
mod error;

pub use bridge::{
    bridge, inbound, outbound, reject_unknown_path, upgrade_handler, SUBPROTOCOLS, UPGRADE_HINT,
};
pub use error::TransportError;
