use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::core::{AppError, Currency, Result};
use crate::modules::commissions::CommissionSplit;
use crate::modules::payments::models::Payment;

/// Only completed purchases are ever stored
pub const PURCHASE_COMPLETED: &str = "completed";

/// A buyer's entitlement to one item. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub payment_id: String,
    pub buyer_id: String,
    pub item_id: String,
    pub seller_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub commission: CommissionSplit,
    pub payment_method: String,
    pub payment_status: String,
    /// Local transaction reference of the paying checkout
    pub transaction_id: String,
    pub gateway_tracker: String,
    /// Snapshot of the payment as it settled
    pub payment_details: serde_json::Value,
    pub purchased_at: DateTime<Utc>,
}

impl Purchase {
    /// Entitlement for a settled payment
    pub fn from_payment(payment: &Payment, payment_method: &str) -> Self {
        let payment_details = serde_json::json!({
            "payment_id": payment.id,
            "tracker": payment.tracker,
            "transaction_ref": payment.transaction_ref,
            "amount": payment.amount,
            "currency": payment.currency,
            "commission": payment.commission,
            "gateway_response": payment.gateway_response,
        });

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payment_id: payment.id.clone(),
            buyer_id: payment.buyer_id.clone(),
            item_id: payment.item_id.clone(),
            seller_id: payment.seller_id.clone(),
            amount: payment.amount,
            currency: payment.currency,
            commission: payment.commission,
            payment_method: payment_method.to_string(),
            payment_status: PURCHASE_COMPLETED.to_string(),
            transaction_id: payment.transaction_ref.clone(),
            gateway_tracker: payment.tracker.clone(),
            payment_details,
            purchased_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PurchaseRow {
    pub id: String,
    pub payment_id: String,
    pub buyer_id: String,
    pub item_id: String,
    pub seller_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub seller_amount: Decimal,
    pub platform_amount: Decimal,
    pub commission_percentage: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: String,
    pub gateway_tracker: String,
    pub payment_details: Json<serde_json::Value>,
    pub purchased_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = AppError;

    fn try_from(row: PurchaseRow) -> Result<Self> {
        Ok(Purchase {
            currency: row.currency.parse().map_err(AppError::Internal)?,
            commission: CommissionSplit {
                seller_amount: row.seller_amount,
                platform_amount: row.platform_amount,
                commission_percentage: row.commission_percentage,
            },
            payment_details: row.payment_details.0,
            id: row.id,
            payment_id: row.payment_id,
            buyer_id: row.buyer_id,
            item_id: row.item_id,
            seller_id: row.seller_id,
            amount: row.amount,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            transaction_id: row.transaction_id,
            gateway_tracker: row.gateway_tracker,
            purchased_at: row.purchased_at,
        })
    }
}
