//! Typed projections of the processor's resources.
//!
//! Each resource is decoded once per successful processor call and never
//! mutated. Required fields are non-optional; a response missing one fails
//! decoding. Fields the processor adds beyond these are ignored.

pub mod card;
pub mod channel;
pub mod customer;
pub mod money;
pub mod payment;
pub mod payment_method;

pub use card::{CardCharge, CardRefund};
pub use channel::{EWalletCharge, OtcPayment, QrCodePayment};
pub use customer::Customer;
pub use money::Amount;
pub use payment::Payment;
pub use payment_method::{
    PaymentMethod, PaymentMethodReusability, PaymentMethodStatus, PaymentMethodType,
};
