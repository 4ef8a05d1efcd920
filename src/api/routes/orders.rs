//! Order Routes
//!
//! - POST /orders - Publish an order to the status topic

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{OrderEnvelope, PublishResponse, SubmitOrderRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::broker::Message;
use crate::mqtt::QoS;

const INVALID_ORDER: &str = "Invalid payload. Required: { name, emp_id, order_list[] }";

/// POST /orders
///
/// Validates the order, stamps it with the server time and publishes it at
/// QoS 1 to the status topic. Nothing is published for an invalid body.
pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> ApiResult<Json<PublishResponse>> {
    let Json(req) = payload.map_err(|_| ApiError::Validation(INVALID_ORDER.to_string()))?;
    let envelope = validate_order(req)?;

    let topic = &state.config.status_topic;
    let message = Message::json(topic.as_str(), &envelope)
        .map_err(|e| ApiError::Internal(format!("Failed to encode order: {}", e)))?
        .qos(QoS::AtLeastOnce);

    let delivered = state.router.publish(message).await.map_err(|e| {
        tracing::warn!(topic = %topic, error = %e, "Order publish rejected by broker");
        ApiError::Publish("MQTT publish failed".to_string())
    })?;

    tracing::info!(
        topic = %topic,
        emp_id = %envelope.emp_id,
        items = envelope.order_list.len(),
        delivered,
        "Published order"
    );

    Ok(Json(PublishResponse { ok: true }))
}

fn validate_order(req: SubmitOrderRequest) -> ApiResult<OrderEnvelope> {
    let invalid = || ApiError::Validation(INVALID_ORDER.to_string());

    let name = req.name.filter(|n| !n.is_empty()).ok_or_else(invalid)?;
    let emp_id = req.emp_id.filter(|e| !e.is_empty()).ok_or_else(invalid)?;
    let order_list = req.order_list.ok_or_else(invalid)?;

    Ok(OrderEnvelope {
        name,
        emp_id,
        order_list,
        ts: Utc::now().timestamp_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_order() {
        let req = SubmitOrderRequest {
            name: Some("Line 3".to_string()),
            emp_id: Some("E-7".to_string()),
            order_list: Some(vec![json!({"sku": "A1"})]),
        };
        let envelope = validate_order(req).unwrap();
        assert_eq!(envelope.name, "Line 3");
        assert!(envelope.ts > 0);
    }

    #[test]
    fn test_empty_order_list_is_allowed() {
        let req = SubmitOrderRequest {
            name: Some("Line 3".to_string()),
            emp_id: Some("E-7".to_string()),
            order_list: Some(Vec::new()),
        };
        assert!(validate_order(req).is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let missing_list = SubmitOrderRequest {
            name: Some("Line 3".to_string()),
            emp_id: Some("E-7".to_string()),
            order_list: None,
        };
        assert!(matches!(
            validate_order(missing_list),
            Err(ApiError::Validation(_))
        ));

        let empty_name = SubmitOrderRequest {
            name: Some(String::new()),
            emp_id: Some("E-7".to_string()),
            order_list: Some(Vec::new()),
        };
        assert!(validate_order(empty_name).is_err());
    }
}
