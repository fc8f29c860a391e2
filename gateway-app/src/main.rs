//! # Payment Gateway Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the processor client
//! - Create the gateway service and the process-wide notification bus
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_hex::{GatewayService, HttpServer, NotificationBus};
use gateway_processor::XenditClient;

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("payment-gateway"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;

    // OpenTelemetry export is only enabled when a collector is configured
    let (telemetry, otel_provider) = match &config.otlp_endpoint {
        Some(endpoint) => {
            let (tracer, provider) = init_tracer(endpoint)?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(provider),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gateway_app=debug,gateway_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    tracing::info!("Starting payment gateway on {}", config.addr());
    tracing::info!("Using processor at {}", config.api_base_url);

    let processor = XenditClient::new(
        config.api_base_url.as_str(),
        config.api_key.as_str(),
        config.processor_timeout,
    )?;
    let service = GatewayService::with_timeout(processor, config.processor_timeout);

    // One bus for the whole process, shared by HTTP handlers and websocket sessions
    let bus = Arc::new(NotificationBus::new());

    let server = HttpServer::new(service, bus);
    server.run(&config.addr()).await?;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
