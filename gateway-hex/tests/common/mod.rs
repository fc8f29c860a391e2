//! Shared helpers for the HTTP and websocket integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
};
use gateway_hex::{GatewayService, HttpServer, NotificationBus};
use gateway_types::{PaymentProcessor, ProcessorError, ProcessorRequest};
use http_body_util::BodyExt;
use serde_json::Value;

/// Processor double replaying canned responses in order.
#[derive(Default)]
pub struct ScriptedProcessor {
    responses: Mutex<VecDeque<Result<Value, ProcessorError>>>,
    requests: Mutex<Vec<ProcessorRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProcessor {
    pub fn respond(self, body: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(body));
        self
    }

    pub fn fail(self, err: ProcessorError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    /// Holds every response back for `delay`, like a slow upstream.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProcessorRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProcessor for ScriptedProcessor {
    async fn send(&self, request: ProcessorRequest) -> Result<Value, ProcessorError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(ProcessorError::Status {
                status: 500,
                body: "no scripted response".into(),
            })
        })
    }
}

/// Server over a shared processor so tests can inspect recorded requests.
pub fn server(processor: ScriptedProcessor) -> (HttpServer<Arc<ScriptedProcessor>>, Arc<ScriptedProcessor>) {
    let processor = Arc::new(processor);
    let service = GatewayService::new(Arc::clone(&processor));
    let server = HttpServer::new(service, Arc::new(NotificationBus::new()));
    (server, processor)
}

pub fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
