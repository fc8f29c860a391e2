//! Data Transfer Objects (DTOs) for requests.
//!
//! Each request body is accepted from gateway clients and forwarded to the
//! processor in the same shape; unset optional fields are omitted on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Amount, PaymentMethodReusability, PaymentMethodStatus, PaymentMethodType};

// ─────────────────────────────────────────────────────────────────────────────
// Customer DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Merchant-side customer reference
    pub reference_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub customer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_detail: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_detail: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_accounts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_documents: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment Method DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register a payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentMethodRequest {
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub reusability: PaymentMethodReusability,
    pub customer_id: String,
    pub reference_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_information: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_debit: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ewallet: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_account: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_the_counter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Partial update of a payment method. At least one field must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePaymentMethodRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reusability: Option<PaymentMethodReusability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentMethodStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_information: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_the_counter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_account: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl UpdatePaymentMethodRequest {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.reference_id.is_none()
            && self.reusability.is_none()
            && self.status.is_none()
            && self.billing_information.is_none()
            && self.over_the_counter.is_none()
            && self.virtual_account.is_none()
            && self.metadata.is_none()
    }
}

/// Filters for listing payment methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPaymentMethodsQuery {
    pub customer_id: Option<String>,
    pub reference_id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub limit: Option<u32>,
    pub after_id: Option<String>,
    pub before_id: Option<String>,
}

impl ListPaymentMethodsQuery {
    /// Query string pairs for the processor, in a stable order.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_param(&mut query, "customer_id", self.customer_id.as_ref());
        push_param(&mut query, "reference_id", self.reference_id.as_ref());
        push_param(&mut query, "status", self.status.as_ref());
        push_param(&mut query, "type", self.method_type.as_ref());
        push_param(&mut query, "limit", self.limit.as_ref());
        push_param(&mut query, "after_id", self.after_id.as_ref());
        push_param(&mut query, "before_id", self.before_id.as_ref());
        query
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a payment against an existing payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub reference_id: String,
    pub amount: Amount,
    pub currency: String,
    pub payment_method_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `AUTOMATIC` or `MANUAL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_information: Option<Value>,
}

/// Filters for listing payments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPaymentsQuery {
    pub id: Option<String>,
    pub reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub limit: Option<u32>,
    pub after_id: Option<String>,
    pub before_id: Option<String>,
}

impl ListPaymentsQuery {
    /// Query string pairs for the processor, in a stable order.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_param(&mut query, "id", self.id.as_ref());
        push_param(&mut query, "reference_id", self.reference_id.as_ref());
        push_param(&mut query, "customer_id", self.customer_id.as_ref());
        push_param(&mut query, "limit", self.limit.as_ref());
        push_param(&mut query, "after_id", self.after_id.as_ref());
        push_param(&mut query, "before_id", self.before_id.as_ref());
        query
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Card DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to charge a tokenised card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardPaymentRequest {
    pub token_id: String,
    pub external_id: String,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_cvn: Option<String>,
    /// Whether to capture immediately (processor default: true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Request to capture a previously authorised card charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureCardPaymentRequest {
    pub amount: Amount,
}

/// Request to refund a captured card charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundCardPaymentRequest {
    pub amount: Amount,
    pub external_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// E-wallet, QR code and over-the-counter DTOs
// ─────────────────────────────────────────────────────────────────────────────

fn default_checkout_method() -> String {
    "ONE_TIME_PAYMENT".to_string()
}

fn default_qr_type() -> String {
    "DYNAMIC".to_string()
}

/// Request to create an e-wallet charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEWalletChargeRequest {
    pub reference_id: String,
    pub currency: String,
    /// Sent to the processor as `charge_amount`; `amount` is accepted as input
    #[serde(rename = "charge_amount", alias = "amount")]
    pub amount: Amount,
    #[serde(default = "default_checkout_method")]
    pub checkout_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Request to issue a payment QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQrCodeRequest {
    pub reference_id: String,
    /// `DYNAMIC` (fixed amount, default) or `STATIC`
    #[serde(rename = "type", default = "default_qr_type")]
    pub qr_type: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Request to create an over-the-counter payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOtcPaymentRequest {
    pub reference_id: String,
    pub currency: String,
    pub amount: Amount,
    /// Inline over-the-counter channel definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

fn push_param<T: ToString>(query: &mut Vec<(String, String)>, key: &str, value: Option<&T>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_string()));
    }
}
