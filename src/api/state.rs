//! Application State
//!
//! Shared state accessible by all API handlers and the transport bridge.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::broker::{EventBus, RouterConfig, TopicRouter};
use crate::registry::DeviceRegistry;
use crate::session::{SessionConfig, SessionManager};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registered field devices
    pub registry: Arc<DeviceRegistry>,
    /// Topic router the gateway publishes through
    pub router: Arc<TopicRouter>,
    /// Broker sessions behind the transport path
    pub sessions: Arc<SessionManager>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create an AppState with default broker settings
    pub fn new(config: ApiConfig) -> Self {
        Self::with_broker(config, RouterConfig::default(), SessionConfig::default())
    }

    /// Create an AppState with explicit router and session settings
    pub fn with_broker(
        config: ApiConfig,
        router_config: RouterConfig,
        session_config: SessionConfig,
    ) -> Self {
        let events = Arc::new(EventBus::default());
        let router = Arc::new(TopicRouter::new(router_config, events));
        let sessions = Arc::new(SessionManager::new(Arc::clone(&router), session_config));

        Self {
            registry: Arc::new(DeviceRegistry::new()),
            router,
            sessions,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Broker lifecycle events
    pub fn events(&self) -> &Arc<EventBus> {
        self.router.events()
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Path that accepts MQTT-over-WebSocket upgrades
    pub transport_path: String,
    /// Topic orders are published to
    pub status_topic: String,
    /// Topic commands are published to
    pub command_topic: String,
    /// Allowed CORS origins; empty means permissive
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            transport_path: "/mqtt".to_string(),
            status_topic: "devices/status".to_string(),
            command_topic: "devices/command".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
