//! Device Registry
//!
//! In-memory table of registered field devices.
//!
//! - **types**: the [`Device`] record
//! - **store**: [`DeviceRegistry`], which enforces identity deduplication
//! - **error**: Error types
//!
//! A device is identified by its employee id (exact match) or its username
//! (case-insensitive match). Either one colliding with an existing record is
//! enough to reject a registration.
//!
//! # Example
//!
//! ```rust
//! use fieldlink::registry::DeviceRegistry;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = DeviceRegistry::new();
//! let device = registry.register("alice", "E-100").await.unwrap();
//! assert_eq!(device.emp_id, "E-100");
//!
//! assert!(registry.register("ALICE", "E-200").await.is_err());
//! # }
//! ```

pub mod error;
pub mod store;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use store::DeviceRegistry;
pub use types::Device;
