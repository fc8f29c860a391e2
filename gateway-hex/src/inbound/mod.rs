//! Inbound Adapters
//!
//! Axum HTTP routes and the websocket endpoint that drive the application layer.

mod handlers;
mod server;
mod ws;

pub use handlers::{ApiError, AppState};
pub use server::HttpServer;
