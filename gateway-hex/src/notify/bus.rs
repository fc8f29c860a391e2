//! Notification bus.
//!
//! Routes subscribe/unsubscribe control messages into the registry and fans
//! published events out to the current subscribers of a topic.

use std::sync::Arc;

use serde_json::{Value, json};

use super::NotifyError;
use super::registry::{Connection, ConnectionId, ConnectionRegistry};
use super::topic::{ClientFrame, DomainEvent, ServerMessage, Topic, events};

/// A subscription change requested by a connection.
#[derive(Debug, Clone, Copy)]
pub enum SubscriptionAction<'a> {
    Subscribe(&'a Topic),
    Unsubscribe(&'a Topic),
}

/// Decides whether a connection may perform a subscription change.
pub trait SubscriptionAuthorizer: Send + Sync {
    fn authorize(&self, connection: ConnectionId, action: &SubscriptionAction<'_>) -> bool;
}

/// Permits every subscription change.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl SubscriptionAuthorizer for AllowAll {
    fn authorize(&self, _connection: ConnectionId, _action: &SubscriptionAction<'_>) -> bool {
        true
    }
}

/// Process-wide notification bus.
///
/// Publishing never blocks and never fails: delivery problems for one
/// subscriber are logged and do not affect the others.
pub struct NotificationBus {
    registry: ConnectionRegistry,
    authorizer: Arc<dyn SubscriptionAuthorizer>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::with_authorizer(Arc::new(AllowAll))
    }

    pub fn with_authorizer(authorizer: Arc<dyn SubscriptionAuthorizer>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            authorizer,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Makes a freshly opened connection known to the bus.
    #[tracing::instrument(skip_all, fields(connection_id = %connection.id()))]
    pub fn connect(&self, connection: &Connection) {
        self.registry.register(connection);
        tracing::debug!("Connection registered");
    }

    /// Drops every subscription held by the connection. Safe to call twice.
    #[tracing::instrument(skip(self))]
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let topics = self.registry.unregister(connection_id);
        tracing::debug!(topics, "Connection unregistered");
    }

    /// Subscribes the connection to the payment's topic and acknowledges it.
    ///
    /// The acknowledgement is queued before the membership becomes visible,
    /// so the subscriber always sees it ahead of any update on the topic.
    /// A connection that was never connected, or has been disconnected, is
    /// refused with `ConnectionClosed`.
    #[tracing::instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    pub fn subscribe(&self, connection: &Connection, payment_id: &str) -> Result<Topic, NotifyError> {
        let result = self.check(connection.id(), payment_id, true).and_then(|topic| {
            if self.registry.is_registered(connection.id()) {
                Ok(topic)
            } else {
                Err(NotifyError::ConnectionClosed(connection.id()))
            }
        });

        match result {
            Ok(topic) => {
                self.reply(connection, events::PAYMENT_SUBSCRIBED, success(&topic));
                if !self.registry.join(connection.id(), &topic)
                    && !self.registry.is_member(connection.id(), &topic)
                {
                    // Disconnected between the check and the join.
                    let e = NotifyError::ConnectionClosed(connection.id());
                    self.reply_error(connection, events::PAYMENT_SUBSCRIBED, &e);
                    return Err(e);
                }
                tracing::debug!(topic = %topic, "Subscribed");
                Ok(topic)
            }
            Err(e) => {
                self.reply_error(connection, events::PAYMENT_SUBSCRIBED, &e);
                Err(e)
            }
        }
    }

    /// Removes the subscription; succeeds whether or not it existed.
    #[tracing::instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    pub fn unsubscribe(
        &self,
        connection: &Connection,
        payment_id: &str,
    ) -> Result<Topic, NotifyError> {
        let result = self.check(connection.id(), payment_id, false);

        match result {
            Ok(topic) => {
                self.registry.leave(connection.id(), &topic);
                self.reply(connection, events::PAYMENT_UNSUBSCRIBED, success(&topic));
                tracing::debug!(topic = %topic, "Unsubscribed");
                Ok(topic)
            }
            Err(e) => {
                self.reply_error(connection, events::PAYMENT_UNSUBSCRIBED, &e);
                Err(e)
            }
        }
    }

    /// Sends `event_name` with `payload` to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers the event was queued for. A
    /// subscriber whose outbound queue is full misses the event.
    #[tracing::instrument(skip(self, payload), fields(topic = %topic))]
    pub fn publish(&self, topic: &Topic, event_name: &str, payload: Value) -> usize {
        let members = self.registry.members_of(topic);
        let message = ServerMessage::new(event_name, payload);

        let mut delivered = 0;
        for member in members {
            match member.deliver(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %member.id(),
                        topic = %topic,
                        error = %e,
                        "Dropping event for subscriber"
                    );
                }
            }
        }

        tracing::debug!(delivered, "Event published");
        delivered
    }

    pub fn publish_event(&self, event: &DomainEvent) -> usize {
        self.publish(&event.topic, &event.event_name, event.payload.clone())
    }

    /// Handles one text frame received from a client.
    ///
    /// Every failure is answered on the same connection; none of them close it.
    pub fn handle_client_message(&self, connection: &Connection, text: &str) {
        let frame = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                self.reply_error(connection, events::ERROR, &e);
                return;
            }
        };

        // Failures were already acknowledged to the client.
        let _ = match frame.event.as_str() {
            events::SUBSCRIBE_PAYMENT => self.subscribe(connection, frame.payment_id()),
            events::UNSUBSCRIBE_PAYMENT => self.unsubscribe(connection, frame.payment_id()),
            other => {
                let e = NotifyError::InvalidMessage(format!("unknown event '{other}'"));
                self.reply_error(connection, events::ERROR, &e);
                Err(e)
            }
        };
    }

    fn check(
        &self,
        connection_id: ConnectionId,
        payment_id: &str,
        subscribing: bool,
    ) -> Result<Topic, NotifyError> {
        let topic = Topic::payment(payment_id)?;
        let action = if subscribing {
            SubscriptionAction::Subscribe(&topic)
        } else {
            SubscriptionAction::Unsubscribe(&topic)
        };
        if !self.authorizer.authorize(connection_id, &action) {
            return Err(NotifyError::Unauthorized);
        }
        Ok(topic)
    }

    fn reply(&self, connection: &Connection, event: &str, data: Value) {
        if let Err(e) = connection.send(ServerMessage::new(event, data)) {
            tracing::warn!(connection_id = %connection.id(), error = %e, "Reply not delivered");
        }
    }

    fn reply_error(&self, connection: &Connection, event: &str, err: &NotifyError) {
        self.reply(
            connection,
            event,
            json!({"status": "error", "message": err.to_string()}),
        );
    }
}

fn success(topic: &Topic) -> Value {
    json!({
        "status": "success",
        "payment_id": topic.payment_id(),
        "topic": topic.as_str(),
    })
}
