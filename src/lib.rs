//! # Fieldlink
//!
//! Device messaging gateway: an embedded MQTT 3.1.1 broker reachable over
//! WebSocket, a registry of field devices, and a small REST surface that
//! publishes orders and commands into the broker.
//!
//! ## Modules
//!
//! - [`mqtt`]: MQTT 3.1.1 packet types and codec
//! - [`broker`]: Topic router, retained messages and lifecycle events
//! - [`session`]: Per-connection MQTT session state machine
//! - [`transport`]: WebSocket upgrade and byte stream adaptation
//! - [`registry`]: In-memory device registry
//! - [`api`]: REST gateway with Axum
//! - [`config`]: TOML and environment configuration
//! - [`telemetry`]: Logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fieldlink::{build_router, ApiConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(ApiConfig::default());
//!     let router = build_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod broker;
pub mod config;
pub mod mqtt;
pub mod registry;
pub mod session;
pub mod telemetry;
pub mod transport;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use broker::{
    BrokerError, BrokerEvent, Delivery, EventBus, Message, RouterConfig, TopicRouter,
};

pub use mqtt::{MqttCodec, Packet, ProtocolError, QoS};

pub use registry::{Device, DeviceRegistry, RegistryError};

pub use session::{CloseReason, SessionConfig, SessionManager};

pub use transport::TransportError;

pub use config::{BrokerConfig, Config, ConfigError, LoggingConfig, ServerConfig};
