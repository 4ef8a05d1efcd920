//! Pub/Sub Broker Core
//!
//! - **topic**: Topic validation and `+`/`#` wildcard matching
//! - **message**: [`Message`] and per-session [`Delivery`]
//! - **router**: [`TopicRouter`], the subscription table and retained store
//! - **events**: Lifecycle [`EventBus`]
//! - **error**: Error types
//!
//! # Delivery Path
//!
//! ```text
//! publish(message)
//!   → validate topic
//!   → retain? store / clear (write lock)
//!   → match every session's filters (read lock)
//!   → try_send Delivery on each matching session's bounded queue
//! ```

pub mod error;
pub mod events;
pub mod message;
pub mod router;
pub mod topic;

pub use error::{BrokerError, BrokerResult, DeliveryFailure};
pub use events::{BrokerEvent, EventBus};
pub use message::{Delivery, Message};
pub use router::{RouterConfig, SessionId, SubscribeOutcome, TopicRouter};
pub use topic::{topic_matches, validate_topic_filter, validate_topic_name};
