//! Post-commit effects attached to successful mutations.
//!
//! The orchestrator describes what should happen after a mutation succeeded;
//! the HTTP layer decides when to run it. Effects never change the result
//! already computed for the caller.

use serde_json::Value;

use crate::notify::{DomainEvent, NotificationBus};

/// A resource produced by a successful processor mutation, with its effects.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub resource: T,
    pub effects: Vec<PostCommit>,
}

impl<T> Committed<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: PostCommit) -> Self {
        self.effects.push(effect);
        self
    }

    /// Runs every effect against the bus and hands back the resource.
    pub fn apply(self, bus: &NotificationBus) -> T {
        for effect in &self.effects {
            effect.apply(bus);
        }
        self.resource
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostCommit {
    PaymentUpdate(PaymentUpdate),
}

/// Status change announced on the `payment_{payment_id}` topic.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub payment_id: String,
    pub status: String,
    pub details: Value,
}

impl PostCommit {
    pub fn payment_update(
        payment_id: impl Into<String>,
        status: impl Into<String>,
        details: Value,
    ) -> Self {
        PostCommit::PaymentUpdate(PaymentUpdate {
            payment_id: payment_id.into(),
            status: status.into(),
            details,
        })
    }

    /// Failures are logged here and never reach the caller.
    pub fn apply(&self, bus: &NotificationBus) {
        match self {
            PostCommit::PaymentUpdate(update) => {
                match DomainEvent::payment_update(
                    &update.payment_id,
                    &update.status,
                    update.details.clone(),
                ) {
                    Ok(event) => {
                        bus.publish_event(&event);
                    }
                    Err(e) => {
                        tracing::warn!(
                            payment_id = %update.payment_id,
                            error = %e,
                            "Skipping payment update"
                        );
                    }
                }
            }
        }
    }
}
