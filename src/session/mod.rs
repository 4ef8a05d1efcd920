//! Broker Sessions
//!
//! - **state**: [`SessionState`] and the pure packet transition
//! - **manager**: [`SessionManager`], one task per connection
//!
//! # Lifecycle
//!
//! ```text
//! AwaitingConnect ──CONNECT──▶ Connected ──DISCONNECT──▶ Closed
//!        │                        │
//!        └── anything else,       └── violation, transport end,
//!            keep-alive expiry        keep-alive expiry, takeover
//!                 ▼                        ▼
//!               Closed                   Closed
//! ```

pub mod manager;
pub mod state;

pub use manager::{SessionConfig, SessionManager, SessionSlot};
pub use state::{Action, CloseReason, SessionState};
