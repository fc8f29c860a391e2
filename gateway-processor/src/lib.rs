//! # Gateway Processor
//!
//! Outbound adapter for the payment processor's REST API.
//! `XenditClient` implements the `PaymentProcessor` port over `reqwest`:
//! every non-2xx status, timeout or transport failure is reported as a
//! `ProcessorError`, never as a panic or a raw `reqwest::Error`.

mod client;

pub use client::XenditClient;

/// Default processor base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.xendit.co";
