use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::commissions::Commission;
use crate::modules::payments::models::PaymentStatus;
use crate::modules::purchases::models::{Purchase, PurchaseRow, PURCHASE_COMPLETED};

const PURCHASE_COLUMNS: &str = r#"
    id, payment_id, buyer_id, item_id, seller_id, amount, currency,
    seller_amount, platform_amount, commission_percentage, payment_method,
    payment_status, transaction_id, gateway_tracker, payment_details, purchased_at
"#;

/// Everything that must become durable when a payment is confirmed paid
#[derive(Debug, Clone)]
pub struct Settlement {
    pub payment_id: String,
    pub gateway_response: serde_json::Value,
    pub purchase: Purchase,
    pub commission: Commission,
}

/// Result of writing a settlement
#[derive(Debug, Clone)]
pub enum SettlementWrite {
    /// Payment flipped to success, purchase and commission inserted
    Recorded {
        purchase: Purchase,
        commission: Commission,
    },
    /// Payment flipped to success, but the buyer already owned the item
    AlreadyOwned { purchase: Purchase },
    /// Payment had already left pending; nothing was written
    NotPending(PaymentStatus),
}

/// Purchase ledger.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn find_completed(&self, buyer_id: &str, item_id: &str) -> Result<Option<Purchase>>;

    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<Purchase>>;

    /// Atomically: payment Pending -> Success, insert purchase, insert commission.
    ///
    /// Implementations must enforce one completed purchase per (buyer, item)
    /// at the storage layer and report a collision as `AlreadyOwned`, not as an error.
    async fn record_settlement(&self, settlement: &Settlement) -> Result<SettlementWrite>;
}

#[derive(Clone)]
pub struct MySqlPurchaseRepository {
    pool: MySqlPool,
}

impl MySqlPurchaseRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl PurchaseRepository for MySqlPurchaseRepository {
    async fn find_completed(&self, buyer_id: &str, item_id: &str) -> Result<Option<Purchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            SELECT {} FROM purchases
            WHERE buyer_id = ? AND item_id = ? AND payment_status = ?
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(buyer_id)
        .bind(item_id)
        .bind(PURCHASE_COMPLETED)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Purchase::try_from).transpose()
    }

    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<Purchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {} FROM purchases WHERE payment_id = ?",
            PURCHASE_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Purchase::try_from).transpose()
    }

    async fn record_settlement(&self, settlement: &Settlement) -> Result<SettlementWrite> {
        let purchase = &settlement.purchase;
        let commission = &settlement.commission;

        let mut tx = self.pool.begin().await?;

        // Row lock on the payment serializes concurrent confirmations
        let flipped = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, gateway_response = ?, updated_at = NOW()
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(PaymentStatus::Success.as_str())
        .bind(Json(&settlement.gateway_response))
        .bind(&settlement.payment_id)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;

            let status: Option<String> =
                sqlx::query_scalar("SELECT status FROM payments WHERE id = ?")
                    .bind(&settlement.payment_id)
                    .fetch_optional(&self.pool)
                    .await?;
            let status = status.ok_or_else(|| {
                AppError::not_found(format!("Payment '{}' not found", settlement.payment_id))
            })?;

            return Ok(SettlementWrite::NotPending(
                status.parse().map_err(AppError::Internal)?,
            ));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, payment_id, buyer_id, item_id, seller_id, amount, currency,
                seller_amount, platform_amount, commission_percentage, payment_method,
                payment_status, transaction_id, gateway_tracker, payment_details, purchased_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.payment_id)
        .bind(&purchase.buyer_id)
        .bind(&purchase.item_id)
        .bind(&purchase.seller_id)
        .bind(purchase.amount)
        .bind(purchase.currency.to_string())
        .bind(purchase.commission.seller_amount)
        .bind(purchase.commission.platform_amount)
        .bind(purchase.commission.commission_percentage)
        .bind(&purchase.payment_method)
        .bind(&purchase.payment_status)
        .bind(&purchase.transaction_id)
        .bind(&purchase.gateway_tracker)
        .bind(Json(&purchase.payment_details))
        .bind(purchase.purchased_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                // Unique (buyer_id, item_id, payment_status): the item is already owned.
                // Keep the status flip, the provider did take the money.
                tx.commit().await?;

                let existing = self
                    .find_completed(&purchase.buyer_id, &purchase.item_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::internal("Purchase conflict reported but no purchase found")
                    })?;
                return Ok(SettlementWrite::AlreadyOwned { purchase: existing });
            }
            Err(e) => return Err(e.into()),
        }

        sqlx::query(
            r#"
            INSERT INTO commissions (
                id, payment_id, purchase_id, buyer_id, seller_id, seller_type,
                total_amount, seller_amount, platform_amount, commission_percentage,
                status, payout_id, paid_out_at, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?)
            "#,
        )
        .bind(&commission.id)
        .bind(&commission.payment_id)
        .bind(&commission.purchase_id)
        .bind(&commission.buyer_id)
        .bind(&commission.seller_id)
        .bind(commission.seller_type.as_str())
        .bind(commission.total_amount)
        .bind(commission.seller_amount)
        .bind(commission.platform_amount)
        .bind(commission.commission_percentage)
        .bind(commission.status.as_str())
        .bind(commission.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SettlementWrite::Recorded {
            purchase: purchase.clone(),
            commission: commission.clone(),
        })
    }
}
