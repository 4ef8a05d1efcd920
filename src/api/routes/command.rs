//! Command Routes
//!
//! - POST /command - Publish a command to the command topic

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::dto::PublishResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::broker::Message;
use crate::mqtt::QoS;

/// POST /command
///
/// Publishes the request body with a server `ts` added, at QoS 1, to the
/// command topic.
pub async fn submit_command(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<PublishResponse>> {
    let Json(body) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let envelope = stamp(body, Utc::now().timestamp_millis());

    let topic = &state.config.command_topic;
    let message = Message::json(topic.as_str(), &envelope)
        .map_err(|e| ApiError::Internal(format!("Failed to encode command: {}", e)))?
        .qos(QoS::AtLeastOnce);

    let delivered = state.router.publish(message).await.map_err(|e| {
        tracing::warn!(topic = %topic, error = %e, "Command publish rejected by broker");
        ApiError::Publish("Command publish failed".to_string())
    })?;

    tracing::info!(topic = %topic, delivered, "Published command");

    Ok(Json(PublishResponse { ok: true }))
}

/// Add the server timestamp; non-object bodies are wrapped under `payload`
fn stamp(body: Value, ts: i64) -> Value {
    match body {
        Value::Object(mut fields) => {
            fields.insert("ts".to_string(), json!(ts));
            Value::Object(fields)
        }
        other => json!({ "payload": other, "ts": ts }),
    }
}
