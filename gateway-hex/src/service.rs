//! Gateway Application Service
//!
//! Turns typed requests into processor calls and processor responses into
//! typed resources. Every failure leaving this module is a `NormalizedError`.
//! Notifications are described through `Committed` and never sent from here.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use gateway_types::{
    Amount, CaptureCardPaymentRequest, CardCharge, CardRefund, CreateCardPaymentRequest,
    CreateCustomerRequest, CreateEWalletChargeRequest, CreateOtcPaymentRequest,
    CreatePaymentMethodRequest, CreatePaymentRequest, CreateQrCodeRequest, Customer,
    EWalletCharge, ListPaymentMethodsQuery, ListPaymentsQuery, NormalizedError, OtcPayment,
    Payment, PaymentMethod, PaymentProcessor, ProcessorError, QrCodePayment,
    RefundCardPaymentRequest, UpdatePaymentMethodRequest,
};

use crate::effects::{Committed, PostCommit};

/// Upper bound on a single processor call unless configured otherwise.
pub const DEFAULT_PROCESSOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Application service for gateway operations.
///
/// Generic over `P: PaymentProcessor` - the outbound adapter is injected at
/// compile time, so tests run against an in-memory processor.
pub struct GatewayService<P: PaymentProcessor> {
    processor: P,
    timeout: Duration,
}

impl<P: PaymentProcessor> GatewayService<P> {
    pub fn new(processor: P) -> Self {
        Self::with_timeout(processor, DEFAULT_PROCESSOR_TIMEOUT)
    }

    pub fn with_timeout(processor: P, timeout: Duration) -> Self {
        Self { processor, timeout }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a customer at the processor.
    #[tracing::instrument(skip(self, req), fields(reference_id = %req.reference_id))]
    pub async fn create_customer(
        &self,
        req: CreateCustomerRequest,
    ) -> Result<Customer, NormalizedError> {
        require("reference_id", &req.reference_id)?;
        let body = encode(&req)?;

        let raw = self
            .execute("Failed to create customer", self.processor.create_customer(body))
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to create customer"))
    }

    /// Fetches a customer by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, NormalizedError> {
        require_id("customer_id", customer_id)?;

        let raw = self
            .execute("Failed to get customer", self.processor.get_customer(customer_id))
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to get customer"))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment methods
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a reusable payment method.
    #[tracing::instrument(skip(self, req), fields(customer_id = %req.customer_id))]
    pub async fn create_payment_method(
        &self,
        req: CreatePaymentMethodRequest,
    ) -> Result<PaymentMethod, NormalizedError> {
        require("customer_id", &req.customer_id)?;
        require("reference_id", &req.reference_id)?;
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to create payment method",
                self.processor.create_payment_method(body),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to create payment method"))
    }

    /// Fetches a payment method by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, NormalizedError> {
        require_id("payment_method_id", payment_method_id)?;

        let raw = self
            .execute(
                "Failed to get payment method",
                self.processor.get_payment_method(payment_method_id),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to get payment method"))
    }

    /// Applies a partial update to a payment method.
    #[tracing::instrument(skip(self, req))]
    pub async fn update_payment_method(
        &self,
        payment_method_id: &str,
        req: UpdatePaymentMethodRequest,
    ) -> Result<PaymentMethod, NormalizedError> {
        require_id("payment_method_id", payment_method_id)?;
        if req.is_empty() {
            return Err(NormalizedError::validation(
                "At least one field must be provided for update",
            ));
        }
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to update payment method",
                self.processor.update_payment_method(payment_method_id, body),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to update payment method"))
    }

    /// Lists payment methods matching the query.
    #[tracing::instrument(skip(self, query))]
    pub async fn list_payment_methods(
        &self,
        query: ListPaymentMethodsQuery,
    ) -> Result<Vec<PaymentMethod>, NormalizedError> {
        let raw = self
            .execute(
                "Failed to list payment methods",
                self.processor.list_payment_methods(query.to_query()),
            )
            .await?;
        decode_list(raw).map_err(|e| e.with_context("Failed to list payment methods"))
    }

    /// Expires a payment method so it can no longer be charged.
    #[tracing::instrument(skip(self))]
    pub async fn expire_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, NormalizedError> {
        require_id("payment_method_id", payment_method_id)?;

        let raw = self
            .execute(
                "Failed to expire payment method",
                self.processor.expire_payment_method(payment_method_id),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to expire payment method"))
    }

    /// Lists the payments made with one payment method.
    #[tracing::instrument(skip(self, query))]
    pub async fn list_payments_by_payment_method(
        &self,
        payment_method_id: &str,
        query: ListPaymentsQuery,
    ) -> Result<Vec<Payment>, NormalizedError> {
        const CONTEXT: &str = "Failed to list payments by payment method";
        require_id("payment_method_id", payment_method_id)?;

        let raw = self
            .execute(
                CONTEXT,
                self.processor
                    .list_payments_by_payment_method(payment_method_id, query.to_query()),
            )
            .await?;
        decode_list(raw).map_err(|e| e.with_context(CONTEXT))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a payment request and announces its status to subscribers.
    #[tracing::instrument(skip(self, req), fields(reference_id = %req.reference_id))]
    pub async fn create_payment(
        &self,
        req: CreatePaymentRequest,
    ) -> Result<Committed<Payment>, NormalizedError> {
        require("reference_id", &req.reference_id)?;
        require("currency", &req.currency)?;
        require("payment_method_id", &req.payment_method_id)?;
        require_positive(&req.amount)?;
        let body = encode(&req)?;

        let raw = self
            .execute("Failed to create payment", self.processor.create_payment(body))
            .await?;
        let payment: Payment =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to create payment"))?;

        let update = PostCommit::payment_update(&payment.id, &payment.status, raw);
        Ok(Committed::new(payment).with_effect(update))
    }

    /// Fetches a payment by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, NormalizedError> {
        require_id("payment_id", payment_id)?;

        let raw = self
            .execute("Failed to get payment", self.processor.get_payment(payment_id))
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to get payment"))
    }

    /// Lists payments matching the query.
    #[tracing::instrument(skip(self, query))]
    pub async fn list_payments(
        &self,
        query: ListPaymentsQuery,
    ) -> Result<Vec<Payment>, NormalizedError> {
        let raw = self
            .execute(
                "Failed to list payments",
                self.processor.list_payments(query.to_query()),
            )
            .await?;
        decode_list(raw).map_err(|e| e.with_context("Failed to list payments"))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Card payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Charges a tokenized card and announces the charge status.
    #[tracing::instrument(skip(self, req), fields(external_id = %req.external_id))]
    pub async fn create_card_payment(
        &self,
        req: CreateCardPaymentRequest,
    ) -> Result<Committed<CardCharge>, NormalizedError> {
        require("token_id", &req.token_id)?;
        require("external_id", &req.external_id)?;
        require_positive(&req.amount)?;
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to create card payment",
                self.processor.create_card_charge(body),
            )
            .await?;
        let charge: CardCharge =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to create card payment"))?;

        let update = PostCommit::payment_update(&charge.id, &charge.status, raw);
        Ok(Committed::new(charge).with_effect(update))
    }

    /// Captures an authorized card charge and announces the new status.
    #[tracing::instrument(skip(self, req))]
    pub async fn capture_card_payment(
        &self,
        charge_id: &str,
        req: CaptureCardPaymentRequest,
    ) -> Result<Committed<CardCharge>, NormalizedError> {
        require_id("charge_id", charge_id)?;
        require_positive(&req.amount)?;
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to capture card payment",
                self.processor.capture_card_charge(charge_id, body),
            )
            .await?;
        let charge: CardCharge =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to capture card payment"))?;

        let update = PostCommit::payment_update(&charge.id, &charge.status, raw);
        Ok(Committed::new(charge).with_effect(update))
    }

    /// Refunds a card charge. Subscribers of the charge, not of the refund,
    /// receive the update.
    #[tracing::instrument(skip(self, req), fields(external_id = %req.external_id))]
    pub async fn refund_card_payment(
        &self,
        charge_id: &str,
        req: RefundCardPaymentRequest,
    ) -> Result<Committed<CardRefund>, NormalizedError> {
        require_id("charge_id", charge_id)?;
        require("external_id", &req.external_id)?;
        require_positive(&req.amount)?;
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to refund card payment",
                self.processor.refund_card_charge(charge_id, body),
            )
            .await?;
        let refund: CardRefund =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to refund card payment"))?;

        let update = PostCommit::payment_update(charge_id, &refund.status, raw);
        Ok(Committed::new(refund).with_effect(update))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // E-wallet charges
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts an e-wallet charge and announces its status.
    #[tracing::instrument(skip(self, req), fields(reference_id = %req.reference_id))]
    pub async fn create_ewallet_charge(
        &self,
        req: CreateEWalletChargeRequest,
    ) -> Result<Committed<EWalletCharge>, NormalizedError> {
        require("reference_id", &req.reference_id)?;
        require("currency", &req.currency)?;
        require_positive(&req.amount)?;
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to create eWallet charge",
                self.processor.create_ewallet_charge(body),
            )
            .await?;
        let charge: EWalletCharge =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to create eWallet charge"))?;

        let update = PostCommit::payment_update(&charge.id, &charge.status, raw);
        Ok(Committed::new(charge).with_effect(update))
    }

    /// Fetches the current state of an e-wallet charge.
    #[tracing::instrument(skip(self))]
    pub async fn get_ewallet_charge_status(
        &self,
        charge_id: &str,
    ) -> Result<EWalletCharge, NormalizedError> {
        require_id("charge_id", charge_id)?;

        let raw = self
            .execute(
                "Failed to get eWallet charge status",
                self.processor.get_ewallet_charge(charge_id),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to get eWallet charge status"))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // QR code payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a QR code payment and announces its status.
    #[tracing::instrument(skip(self, req), fields(reference_id = %req.reference_id))]
    pub async fn create_qr_code_payment(
        &self,
        req: CreateQrCodeRequest,
    ) -> Result<Committed<QrCodePayment>, NormalizedError> {
        require("reference_id", &req.reference_id)?;
        require("currency", &req.currency)?;
        if let Some(amount) = &req.amount {
            require_positive(amount)?;
        }
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to create QR code payment",
                self.processor.create_qr_code(body),
            )
            .await?;
        let qr: QrCodePayment =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to create QR code payment"))?;

        let update = PostCommit::payment_update(&qr.id, &qr.status, raw);
        Ok(Committed::new(qr).with_effect(update))
    }

    /// Fetches the current state of a QR code payment.
    #[tracing::instrument(skip(self))]
    pub async fn get_qr_code_payment_status(
        &self,
        qr_code_id: &str,
    ) -> Result<QrCodePayment, NormalizedError> {
        require_id("qr_code_id", qr_code_id)?;

        let raw = self
            .execute(
                "Failed to get QR code payment status",
                self.processor.get_qr_code(qr_code_id),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to get QR code payment status"))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Over-the-counter payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates an over-the-counter payment code and announces its status.
    #[tracing::instrument(skip(self, req), fields(reference_id = %req.reference_id))]
    pub async fn create_otc_payment(
        &self,
        req: CreateOtcPaymentRequest,
    ) -> Result<Committed<OtcPayment>, NormalizedError> {
        require("reference_id", &req.reference_id)?;
        require("currency", &req.currency)?;
        require_positive(&req.amount)?;
        let body = encode(&req)?;

        let raw = self
            .execute(
                "Failed to create OTC payment",
                self.processor.create_payment(body),
            )
            .await?;
        let otc: OtcPayment =
            decode(raw.clone()).map_err(|e| e.with_context("Failed to create OTC payment"))?;

        let update = PostCommit::payment_update(&otc.id, &otc.status, raw);
        Ok(Committed::new(otc).with_effect(update))
    }

    /// Fetches the current state of an over-the-counter payment.
    #[tracing::instrument(skip(self))]
    pub async fn get_otc_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<OtcPayment, NormalizedError> {
        require_id("payment_id", payment_id)?;

        let raw = self
            .execute(
                "Failed to get OTC payment status",
                self.processor.get_payment(payment_id),
            )
            .await?;
        decode(raw).map_err(|e| e.with_context("Failed to get OTC payment status"))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Processor invocation
    // ─────────────────────────────────────────────────────────────────────────────

    /// The single point where processor failures become `NormalizedError`s.
    async fn execute<F>(&self, context: &str, call: F) -> Result<Value, NormalizedError>
    where
        F: Future<Output = Result<Value, ProcessorError>>,
    {
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProcessorError::Timeout(self.timeout)),
        };

        result.map_err(|e| {
            let err = NormalizedError::from(e).with_context(context);
            tracing::warn!(kind = %err.kind, status = err.http_status, error = %err, "Processor call failed");
            err
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding, decoding and input checks
// ─────────────────────────────────────────────────────────────────────────────

fn encode<T: Serialize>(req: &T) -> Result<Value, NormalizedError> {
    serde_json::to_value(req).map_err(|e| {
        NormalizedError::internal(format!("Failed to encode request: {}", e)).with_cause(e)
    })
}

fn decode<T: DeserializeOwned>(raw: Value) -> Result<T, NormalizedError> {
    serde_json::from_value(raw).map_err(|e| {
        NormalizedError::internal(format!("Unexpected processor response: {}", e)).with_cause(e)
    })
}

/// Decodes the `data` page of a list response. One bad record fails the whole list.
fn decode_list<T: DeserializeOwned>(mut raw: Value) -> Result<Vec<T>, NormalizedError> {
    let records = match raw.get_mut("data").map(Value::take) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(records)) => records,
        Some(_) => {
            return Err(NormalizedError::internal(
                "Unexpected processor response: data is not a list",
            ));
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|e| {
                NormalizedError::internal(format!(
                    "Unexpected processor response: record {}: {}",
                    index, e
                ))
                .with_cause(e)
            })
        })
        .collect()
}

fn require(field: &str, value: &str) -> Result<(), NormalizedError> {
    if value.trim().is_empty() {
        return Err(NormalizedError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Identifiers are interpolated into processor paths, so they must stay a single segment.
fn require_id(field: &str, value: &str) -> Result<(), NormalizedError> {
    require(field, value)?;
    if value.contains(['/', '?', '#', '%']) {
        return Err(NormalizedError::validation(format!(
            "{} contains invalid characters",
            field
        )));
    }
    Ok(())
}

fn require_positive(amount: &Amount) -> Result<(), NormalizedError> {
    if !amount.is_positive() {
        return Err(NormalizedError::validation("Amount must be positive"));
    }
    Ok(())
}
