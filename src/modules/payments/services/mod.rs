pub mod checkout_service;
pub mod earnings;
pub mod reconciliation_service;

pub use checkout_service::{CheckoutInput, CheckoutResponse, CheckoutService};
pub use earnings::{EarningsDistributor, SellerEarningsDistributor};
pub use reconciliation_service::{
    PaymentStatusView, ReconciliationOutcome, ReconciliationService, ReturnOutcome, ReturnQuery,
    WebhookAck,
};
