pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::{configure, ReturnPageSettings};
pub use models::{EarningsStatus, NewPayment, Payment, PaymentStatus};
pub use repositories::{MySqlPaymentRepository, PaymentRepository};
pub use services::{
    CheckoutService, EarningsDistributor, ReconciliationOutcome, ReconciliationService,
    ReturnOutcome, ReturnQuery, SellerEarningsDistributor, WebhookAck,
};
