//! Fieldlink HTTP Gateway
//!
//! REST layer over the device registry and the topic router, built with
//! Axum. The same router also serves the MQTT-over-WebSocket transport path.
//!
//! # Endpoints
//!
//! ## Devices
//! - `GET /devices` - List registered devices
//! - `POST /devices` - Register a device
//!
//! ## Publishing
//! - `POST /orders` - Publish an order to the status topic
//! - `POST /command` - Publish a command to the command topic
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health` - Gateway status
//!
//! ## Transport
//! - `GET /mqtt` (configurable) - MQTT over WebSocket
//!
//! # Example
//!
//! ```rust,no_run
//! use fieldlink::api::{serve, ApiConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(ApiConfig::default());
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::transport;

/// REST paths the transport path may not shadow
pub const RESERVED_PATHS: [&str; 5] = ["/devices", "/orders", "/command", "/health", "/health/live"];

/// Build the gateway router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let transport_path = state.config.transport_path.clone();

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route(
            "/devices",
            get(routes::devices::list_devices).post(routes::devices::register_device),
        )
        .route("/orders", post(routes::orders::submit_order))
        .route("/command", post(routes::command::submit_command))
        .route("/health", get(routes::health::full_health))
        .route("/health/live", get(routes::health::liveness))
        .route(&transport_path, get(transport::upgrade_handler))
        .fallback(transport::reject_unknown_path)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Start the gateway server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let transport_path = state.config.transport_path.clone();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        transport_path = %transport_path,
        "Fieldlink gateway listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Fieldlink gateway shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
