//! Device record

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A registered field device
///
/// Records are created by registration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Display name chosen by the operator
    pub username: String,
    /// Employee id the device is issued to
    pub emp_id: String,
    /// Registration time, epoch milliseconds
    pub created_at: i64,
}

impl Device {
    /// Create a device stamped with the current time
    pub fn new(username: impl Into<String>, emp_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            emp_id: emp_id.into(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// True when either identity key collides with this record
    pub fn collides_with(&self, username: &str, emp_id: &str) -> bool {
        self.emp_id == emp_id || self.username.to_lowercase() == username.to_lowercase()
    }
}
