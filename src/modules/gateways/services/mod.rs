pub mod gateway_trait;
pub mod safepay;

pub use gateway_trait::{
    CheckoutRequest, CheckoutSession, PaymentGateway, SettlementState, SettlementStatus,
    WebhookEvent, WebhookEventStatus,
};
pub use safepay::{SafepayClient, SIGNATURE_HEADER};
