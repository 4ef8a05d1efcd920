//! Device registry store

use tokio::sync::RwLock;

use super::error::{RegistryError, RegistryResult};
use super::types::Device;

pub(crate) const MISSING_FIELDS: &str = "username and empId are required";

/// In-memory device table, kept in insertion order
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Device>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device
    ///
    /// Fails with [`RegistryError::Validation`] when either field is empty and
    /// with [`RegistryError::Conflict`] when the employee id or the
    /// case-folded username is already taken. The lookup and the append run
    /// under a single write lock.
    pub async fn register(&self, username: &str, emp_id: &str) -> RegistryResult<Device> {
        if username.is_empty() || emp_id.is_empty() {
            return Err(RegistryError::Validation(MISSING_FIELDS.to_string()));
        }

        let mut devices = self.devices.write().await;

        if let Some(existing) = devices.iter().find(|d| d.collides_with(username, emp_id)) {
            return Err(RegistryError::Conflict {
                existing: existing.clone(),
            });
        }

        let device = Device::new(username, emp_id);
        devices.push(device.clone());
        Ok(device)
    }

    /// All devices in registration order
    pub async fn list(&self) -> Vec<Device> {
        self.devices.read().await.clone()
    }

    /// Number of registered devices
    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    /// True when no device is registered
    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }
}
