pub mod services;

pub use services::{
    CheckoutRequest, CheckoutSession, PaymentGateway, SafepayClient, SettlementState,
    SettlementStatus, WebhookEvent, WebhookEventStatus, SIGNATURE_HEADER,
};
