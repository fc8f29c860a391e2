//! # Gateway Types
//!
//! Domain types and port traits for the payment gateway.
//! This crate has ZERO external IO dependencies - only data structures,
//! validation rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Typed projections of processor resources (Customer, Payment, ...)
//! - `ports/` - The `PaymentProcessor` trait that outbound adapters implement
//! - `dto/` - Request bodies accepted at the HTTP boundary
//! - `error/` - The normalized error taxonomy shared by every layer

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Amount, CardCharge, CardRefund, Customer, EWalletCharge, OtcPayment, Payment, PaymentMethod,
    PaymentMethodReusability, PaymentMethodStatus, PaymentMethodType, QrCodePayment,
};
pub use dto::*;
pub use error::{BoxError, ErrorKind, NormalizedError, ProcessorError};
pub use ports::{HttpMethod, PaymentProcessor, ProcessorRequest};
