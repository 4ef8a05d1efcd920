//! Data Transfer Objects
//!
//! Request and response types for the gateway endpoints.
//! Field names follow what deployed devices already send and expect.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::registry::Device;

// ============================================
// DEVICE DTOs
// ============================================

/// Device registration request
///
/// The employee id is accepted as `empId`, `employeeId` or `emp_id`, and as a
/// JSON string or number.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterDeviceRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(
        default,
        rename = "empId",
        alias = "employeeId",
        alias = "emp_id",
        deserialize_with = "string_or_number"
    )]
    pub emp_id: Option<String>,
}

/// Device registration response
#[derive(Debug, Serialize)]
pub struct RegisterDeviceResponse {
    pub ok: bool,
    pub item: Device,
}

/// Device list response
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub items: Vec<Device>,
}

// ============================================
// ORDER DTOs
// ============================================

/// Order submission request
#[derive(Debug, Default, Deserialize)]
pub struct SubmitOrderRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "employeeId",
        alias = "empId",
        deserialize_with = "string_or_number"
    )]
    pub emp_id: Option<String>,
    #[serde(default, alias = "orderList")]
    pub order_list: Option<Vec<Value>>,
}

/// Order envelope published to the status topic
#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub name: String,
    pub emp_id: String,
    pub order_list: Vec<Value>,
    /// Server time, epoch milliseconds
    pub ts: i64,
}

/// Response for a successful gateway publish
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub ok: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Path accepting MQTT-over-WebSocket upgrades
    pub ws_path: String,
    pub topics: TopicsDto,
    /// Registered devices
    pub devices: usize,
    /// Running broker sessions
    pub sessions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

/// Fixed gateway topics
#[derive(Debug, Serialize)]
pub struct TopicsDto {
    pub status: String,
    pub command: String,
}

// ============================================
// HELPERS
// ============================================

/// Accept a JSON string or number as text
///
/// `null` and any other JSON type read as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_request_aliases() {
        for body in [
            json!({"username": "alice", "empId": "E-1"}),
            json!({"username": "alice", "employeeId": "E-1"}),
            json!({"username": "alice", "emp_id": "E-1"}),
        ] {
            let req: RegisterDeviceRequest = serde_json::from_value(body).unwrap();
            assert_eq!(req.emp_id.as_deref(), Some("E-1"));
        }
    }

    #[test]
    fn test_numeric_emp_id() {
        let req: RegisterDeviceRequest =
            serde_json::from_value(json!({"username": "bob", "empId": 1042})).unwrap();
        assert_eq!(req.emp_id.as_deref(), Some("1042"));
    }

    #[test]
    fn test_numeric_and_string_emp_id_are_the_same_id() {
        let numeric: RegisterDeviceRequest =
            serde_json::from_value(json!({"username": "bob", "empId": 1042})).unwrap();
        let text: RegisterDeviceRequest =
            serde_json::from_value(json!({"username": "bob", "empId": "1042"})).unwrap();
        assert_eq!(numeric.emp_id, text.emp_id);
    }

    #[test]
    fn test_missing_fields_are_none() {
        let req: RegisterDeviceRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.username.is_none());
        assert!(req.emp_id.is_none());
    }

    #[test]
    fn test_order_request_aliases() {
        let req: SubmitOrderRequest = serde_json::from_value(json!({
            "name": "Line 3",
            "employeeId": "E-7",
            "orderList": [{"sku": "A1", "qty": 2}]
        }))
        .unwrap();

        assert_eq!(req.name.as_deref(), Some("Line 3"));
        assert_eq!(req.emp_id.as_deref(), Some("E-7"));
        assert_eq!(req.order_list.unwrap().len(), 1);
    }

    #[test]
    fn test_order_list_must_be_array() {
        let result: Result<SubmitOrderRequest, _> = serde_json::from_value(json!({
            "name": "Line 3",
            "emp_id": "E-7",
            "order_list": "A1"
        }));
        assert!(result.is_err());
    }
}
