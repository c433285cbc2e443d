use crate::core::{Currency, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment gateway contract used by checkout and reconciliation
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session and return where to send the buyer.
    ///
    /// A response without a tracker token is an error, never retried.
    async fn initiate_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession>;

    /// Ask the provider what state a tracker is in. Side-effect free.
    async fn verify_settlement(&self, tracker: &str) -> Result<SettlementState>;

    /// Check a webhook signature over the exact bytes received.
    ///
    /// Returns false for a missing or malformed signature.
    fn verify_webhook_signature(&self, raw_body: &[u8], signature: Option<&str>) -> bool;

    /// Normalize a webhook body. No I/O.
    fn parse_webhook_event(&self, payload: &serde_json::Value) -> Result<WebhookEvent>;

    /// Gateway name, recorded as the purchase payment method
    fn name(&self) -> &str;
}

/// Checkout request data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub amount: Decimal,
    pub currency: Currency,
    pub buyer_id: String,
    pub item_id: String,
    pub seller_id: String,
    /// Free-form data echoed back by the provider
    pub metadata: serde_json::Value,
}

/// Hosted checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub redirect_url: String,
    /// Provider tracker token, the reconciliation key
    pub tracker: String,
    pub transaction_ref: String,
}

/// Provider verdict on a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Paid,
    Failed,
    /// Not final yet. The payment must stay pending.
    Pending,
}

/// Provider-reported state of a tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementState {
    pub tracker: String,
    pub state: String,
    pub status: SettlementStatus,
    pub amount: Option<Decimal>,
    /// Full provider response, kept on the payment for audit
    pub raw: serde_json::Value,
}

/// Normalized webhook outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventStatus {
    Paid,
    Failed,
    Unknown,
}

/// Webhook event data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub tracker: String,
    pub event_type: String,
    pub status: WebhookEventStatus,
    pub amount: Option<Decimal>,
    pub metadata: serde_json::Value,
}
