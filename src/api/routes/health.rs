//! Health Routes
//!
//! - GET /health/live - Liveness check (process is alive)
//! - GET /health - Gateway status, transport path and topics

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{HealthResponse, TopicsDto};
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ws_path: state.config.transport_path.clone(),
        topics: TopicsDto {
            status: state.config.status_topic.clone(),
            command: state.config.command_topic.clone(),
        },
        devices: state.registry.len().await,
        sessions: state.sessions.active_sessions(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::ApiConfig;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_health_reports_topics() {
        let state = Arc::new(AppState::new(ApiConfig::default()));
        state.registry.register("alice", "E-1").await.unwrap();

        let Json(health) = full_health(State(state)).await;
        assert!(health.ok);
        assert_eq!(health.ws_path, "/mqtt");
        assert_eq!(health.topics.status, "devices/status");
        assert_eq!(health.topics.command, "devices/command");
        assert_eq!(health.devices, 1);
        assert_eq!(health.sessions, 0);
    }
}
