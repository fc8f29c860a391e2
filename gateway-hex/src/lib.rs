//! # Gateway Hex
//!
//! Application layer and inbound adapters for the payment gateway.
//!
//! ## Architecture
//!
//! - `service/` - Request orchestrator (typed requests in, typed resources or
//!   normalized errors out)
//! - `effects/` - Post-commit effects returned by mutating operations
//! - `notify/` - Notification bus and connection registry
//! - `inbound/` - HTTP and websocket adapters (Axum server)
//!
//! The service is generic over `P: PaymentProcessor`, allowing different
//! processor adapters to be injected.

pub mod effects;
pub mod inbound;
pub mod notify;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use effects::{Committed, PaymentUpdate, PostCommit};
pub use inbound::HttpServer;
pub use notify::NotificationBus;
pub use service::{DEFAULT_PROCESSOR_TIMEOUT, GatewayService};
