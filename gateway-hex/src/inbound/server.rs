//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use gateway_types::PaymentProcessor;

use super::handlers::{self, AppState};
use super::ws;
use crate::GatewayService;
use crate::notify::NotificationBus;

/// HTTP and websocket server for the payment gateway.
pub struct HttpServer<P: PaymentProcessor> {
    state: Arc<AppState<P>>,
}

impl<P: PaymentProcessor> HttpServer<P> {
    /// Creates a server publishing payment updates on `bus`.
    pub fn new(service: GatewayService<P>, bus: Arc<NotificationBus>) -> Self {
        Self {
            state: Arc::new(AppState {
                service: Arc::new(service),
                bus,
            }),
        }
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.state.bus
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/ws", get(ws::ws_handler::<P>))
            .route("/customers", post(handlers::create_customer::<P>))
            .route("/customers/{id}", get(handlers::get_customer::<P>))
            .route(
                "/payment-methods",
                post(handlers::create_payment_method::<P>)
                    .get(handlers::list_payment_methods::<P>),
            )
            .route(
                "/payment-methods/{id}",
                get(handlers::get_payment_method::<P>)
                    .patch(handlers::update_payment_method::<P>),
            )
            .route(
                "/payment-methods/{id}/expire",
                post(handlers::expire_payment_method::<P>),
            )
            .route(
                "/payment-methods/{id}/payments",
                get(handlers::list_payments_by_payment_method::<P>),
            )
            .route(
                "/payments",
                post(handlers::create_payment::<P>).get(handlers::list_payments::<P>),
            )
            .route("/payments/{id}", get(handlers::get_payment::<P>))
            .route("/card-payments", post(handlers::create_card_payment::<P>))
            .route(
                "/card-payments/{id}/capture",
                post(handlers::capture_card_payment::<P>),
            )
            .route(
                "/card-payments/{id}/refund",
                post(handlers::refund_card_payment::<P>),
            )
            .route("/ewallet-charges", post(handlers::create_ewallet_charge::<P>))
            .route("/ewallet-charges/{id}", get(handlers::get_ewallet_charge::<P>))
            .route("/qr-codes", post(handlers::create_qr_code::<P>))
            .route("/qr-codes/{id}", get(handlers::get_qr_code::<P>))
            .route("/otc-payments", post(handlers::create_otc_payment::<P>))
            .route("/otc-payments/{id}", get(handlers::get_otc_payment::<P>))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
