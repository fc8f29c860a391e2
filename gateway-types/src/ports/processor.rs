//! Payment processor port.
//!
//! This is the outbound port in our hexagonal architecture: the orchestrator
//! talks to the external processor only through `PaymentProcessor`.
//! Adapters implement the single `send` method; the per-endpoint methods map
//! each processor resource onto a `ProcessorRequest`.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// A single call against the processor's REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorRequest {
    pub method: HttpMethod,
    /// Path relative to the processor base URL, always starting with `/`.
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl ProcessorRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body,
            query: Vec::new(),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Patch,
            path: path.into(),
            body: Some(body),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// The external payment processor, seen as an opaque JSON-over-HTTP service.
///
/// Every method returns the processor's raw JSON body on success, or a
/// `ProcessorError` on a non-2xx status, timeout or transport failure.
#[async_trait::async_trait]
pub trait PaymentProcessor: Send + Sync + 'static {
    /// Executes one request against the processor.
    async fn send(&self, request: ProcessorRequest) -> Result<Value, ProcessorError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_customer(&self, body: Value) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post("/customers", Some(body)))
            .await
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get(format!("/customers/{}", customer_id)))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment Methods
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_payment_method(&self, body: Value) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post("/v2/payment_methods", Some(body)))
            .await
    }

    async fn get_payment_method(&self, payment_method_id: &str) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get(format!(
            "/v2/payment_methods/{}",
            payment_method_id
        )))
        .await
    }

    async fn update_payment_method(
        &self,
        payment_method_id: &str,
        body: Value,
    ) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::patch(
            format!("/v2/payment_methods/{}", payment_method_id),
            body,
        ))
        .await
    }

    async fn list_payment_methods(
        &self,
        query: Vec<(String, String)>,
    ) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get("/v2/payment_methods").with_query(query))
            .await
    }

    async fn expire_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post(
            format!("/v2/payment_methods/{}/expire", payment_method_id),
            None,
        ))
        .await
    }

    async fn list_payments_by_payment_method(
        &self,
        payment_method_id: &str,
        query: Vec<(String, String)>,
    ) -> Result<Value, ProcessorError> {
        self.send(
            ProcessorRequest::get(format!("/v2/payment_methods/{}/payments", payment_method_id))
                .with_query(query),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments (payment requests, also used for over-the-counter payments)
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_payment(&self, body: Value) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post("/payment_requests", Some(body)))
            .await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get(format!(
            "/payment_requests/{}",
            payment_id
        )))
        .await
    }

    async fn list_payments(&self, query: Vec<(String, String)>) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get("/payment_requests").with_query(query))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Card charges
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_card_charge(&self, body: Value) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post("/credit_card_charges", Some(body)))
            .await
    }

    async fn capture_card_charge(
        &self,
        charge_id: &str,
        body: Value,
    ) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post(
            format!("/credit_card_charges/{}/capture", charge_id),
            Some(body),
        ))
        .await
    }

    async fn refund_card_charge(
        &self,
        charge_id: &str,
        body: Value,
    ) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post(
            format!("/credit_card_charges/{}/refund", charge_id),
            Some(body),
        ))
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // E-wallets, QR codes
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_ewallet_charge(&self, body: Value) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post("/ewallets/charges", Some(body)))
            .await
    }

    async fn get_ewallet_charge(&self, charge_id: &str) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get(format!(
            "/ewallets/charges/{}",
            charge_id
        )))
        .await
    }

    async fn create_qr_code(&self, body: Value) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::post("/qr_codes", Some(body)))
            .await
    }

    async fn get_qr_code(&self, qr_code_id: &str) -> Result<Value, ProcessorError> {
        self.send(ProcessorRequest::get(format!("/qr_codes/{}", qr_code_id)))
            .await
    }
}

#[async_trait::async_trait]
impl<T: PaymentProcessor> PaymentProcessor for Arc<T> {
    async fn send(&self, request: ProcessorRequest) -> Result<Value, ProcessorError> {
        (**self).send(request).await
    }
}
