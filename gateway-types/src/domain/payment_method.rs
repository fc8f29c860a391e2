//! Payment method resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodType {
    Card,
    DirectDebit,
    Ewallet,
    VirtualAccount,
    QrCode,
    OverTheCounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodReusability {
    SingleUse,
    MultipleUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodStatus {
    Active,
    Expired,
    Inactive,
    Pending,
    RequiresAction,
    Failed,
}

impl std::fmt::Display for PaymentMethodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethodStatus::Active => "ACTIVE",
            PaymentMethodStatus::Expired => "EXPIRED",
            PaymentMethodStatus::Inactive => "INACTIVE",
            PaymentMethodStatus::Pending => "PENDING",
            PaymentMethodStatus::RequiresAction => "REQUIRES_ACTION",
            PaymentMethodStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// A tokenised means of payment registered with the processor.
///
/// Channel-specific details (`card`, `ewallet`, ...) are kept as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub status: PaymentMethodStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reusability: Option<PaymentMethodReusability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}
