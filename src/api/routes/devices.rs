//! Device Routes
//!
//! - GET /devices - List registered devices
//! - POST /devices - Register a device

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DeviceListResponse, RegisterDeviceRequest, RegisterDeviceResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::registry::store::MISSING_FIELDS;

/// GET /devices
///
/// All devices in registration order.
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<DeviceListResponse> {
    Json(DeviceListResponse {
        items: state.registry.list().await,
    })
}

/// POST /devices
///
/// Register a device. A device matching an existing record by employee id,
/// or by username ignoring case, is refused with 409 and the existing record.
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterDeviceResponse>)> {
    let Json(req) = payload.map_err(|_| ApiError::Validation(MISSING_FIELDS.to_string()))?;

    let username = req.username.unwrap_or_default();
    let emp_id = req.emp_id.unwrap_or_default();

    let device = state.registry.register(&username, &emp_id).await?;

    tracing::info!(
        username = %device.username,
        emp_id = %device.emp_id,
        "Registered device"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterDeviceResponse {
            ok: true,
            item: device,
        }),
    ))
}
