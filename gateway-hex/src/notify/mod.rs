//! Subscription-scoped notification layer.
//!
//! - `registry` - live connections and their topic memberships
//! - `bus` - subscribe/unsubscribe control handling and topic fan-out
//! - `topic` - topic naming and the wire messages exchanged with clients
//!
//! The bus is constructed once by the application entry point and handed to
//! every component that publishes or accepts connections.

mod bus;
mod registry;
mod topic;

pub use bus::{AllowAll, NotificationBus, SubscriptionAction, SubscriptionAuthorizer};
pub use registry::{
    Connection, ConnectionId, ConnectionRef, ConnectionRegistry, OUTBOX_CAPACITY, Outbox,
};
pub use topic::{ClientFrame, DomainEvent, ServerMessage, Topic, events};

/// Errors raised by the notification layer.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{0}")]
    InvalidTopic(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    #[error("outbound queue of connection {0} is full")]
    Backpressure(ConnectionId),

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
