//! Registry error types

use thiserror::Error;

use super::types::Device;

/// Errors returned by the device registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A required field was missing or empty
    #[error("{0}")]
    Validation(String),

    /// A device with the same employee id or username already exists
    #[error("Device already exists")]
    Conflict {
        /// The record that blocked the registration
        existing: Device,
    },
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
