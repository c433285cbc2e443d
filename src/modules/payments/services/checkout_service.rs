use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::{AppError, Currency, Result};
use crate::modules::catalog::CatalogLookup;
use crate::modules::commissions::{CommissionSchedule, CommissionSplit};
use crate::modules::gateways::{CheckoutRequest, PaymentGateway};
use crate::modules::payments::models::{NewPayment, Payment};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::purchases::PurchaseRepository;

/// Body of POST /payments/checkout
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub item_id: String,
}

/// Where to send the buyer, plus the breakdown they are paying into
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub payment_id: String,
    pub payment_url: String,
    pub tracker: String,
    pub transaction_ref: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub commission_breakdown: CommissionSplit,
}

/// Opens checkout sessions and records the pending payment
pub struct CheckoutService {
    catalog: Arc<dyn CatalogLookup>,
    payment_repo: Arc<dyn PaymentRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn PaymentGateway>,
    schedule: CommissionSchedule,
    currency: Currency,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        payment_repo: Arc<dyn PaymentRepository>,
        purchase_repo: Arc<dyn PurchaseRepository>,
        gateway: Arc<dyn PaymentGateway>,
        schedule: CommissionSchedule,
        currency: Currency,
    ) -> Self {
        Self {
            catalog,
            payment_repo,
            purchase_repo,
            gateway,
            schedule,
            currency,
        }
    }

    /// Start a checkout for `item_id` on behalf of `buyer_id`
    ///
    /// # Errors
    /// * `NotFound` - Item does not exist
    /// * `Validation` - Item not approved, owned by the buyer, or already purchased
    /// * `GatewayUnavailable` - Session could not be opened; no payment is recorded
    pub async fn initiate(&self, buyer_id: &str, item_id: &str) -> Result<CheckoutResponse> {
        if item_id.trim().is_empty() {
            return Err(AppError::validation("item_id is required"));
        }

        let item = self
            .catalog
            .find_item(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item '{}' not found", item_id)))?;

        if !item.is_approved() {
            return Err(AppError::validation("Item is not available for purchase"));
        }

        if item.seller_id == buyer_id {
            return Err(AppError::validation("You cannot purchase your own item"));
        }

        if self
            .purchase_repo
            .find_completed(buyer_id, item_id)
            .await?
            .is_some()
        {
            return Err(AppError::validation("You have already purchased this item"));
        }

        let amount = self.currency.round(item.effective_price());
        self.currency
            .validate_amount(amount)
            .map_err(AppError::validation)?;

        let split = self.schedule.split(amount, item.seller_type, self.currency);

        let session = self
            .gateway
            .initiate_checkout(CheckoutRequest {
                amount,
                currency: self.currency,
                buyer_id: buyer_id.to_string(),
                item_id: item.id.clone(),
                seller_id: item.seller_id.clone(),
                metadata: serde_json::json!({
                    "item_title": item.title,
                    "seller_type": item.seller_type,
                }),
            })
            .await?;

        let payment = Payment::new(NewPayment {
            tracker: session.tracker.clone(),
            transaction_ref: session.transaction_ref.clone(),
            buyer_id: buyer_id.to_string(),
            item_id: item.id.clone(),
            seller_id: item.seller_id.clone(),
            amount,
            currency: self.currency,
            seller_type: item.seller_type,
            commission: split,
            gateway_response: None,
        })?;

        let payment = self.payment_repo.create(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            tracker = %payment.tracker,
            buyer_id = %buyer_id,
            item_id = %item_id,
            amount = %amount,
            gateway = %self.gateway.name(),
            "Checkout initiated"
        );

        Ok(CheckoutResponse {
            payment_id: payment.id,
            payment_url: session.redirect_url,
            tracker: payment.tracker,
            transaction_ref: payment.transaction_ref,
            amount,
            currency: self.currency,
            commission_breakdown: split,
        })
    }
}
