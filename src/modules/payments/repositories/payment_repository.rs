use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::payments::models::{EarningsStatus, Payment, PaymentRow, PaymentStatus};

pub(crate) const PAYMENT_COLUMNS: &str = r#"
    id, tracker, transaction_ref, buyer_id, item_id, seller_id, amount,
    currency, seller_type, seller_amount, platform_amount, commission_percentage,
    status, earnings_status, gateway_response, created_at, updated_at
"#;

/// Payment record store.
///
/// The Pending -> Success transition is not here: it commits together with
/// the purchase and commission inserts in `PurchaseRepository::record_settlement`.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<Payment>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>>;

    async fn find_by_tracker(&self, tracker: &str) -> Result<Option<Payment>>;

    /// Pending -> Failed. Returns false when the payment was not pending.
    async fn mark_failed(
        &self,
        id: &str,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<bool>;

    /// Unset -> Processing. Returns false when another worker holds or
    /// finished the distribution.
    async fn claim_earnings(&self, id: &str) -> Result<bool>;

    /// Processing -> unset, after a failed distribution
    async fn release_earnings(&self, id: &str) -> Result<()>;

    async fn mark_earnings_processed(&self, id: &str) -> Result<()>;

    /// Successful payments whose earnings were never distributed, oldest first
    async fn find_pending_earnings(&self, limit: u32) -> Result<Vec<Payment>>;
}

#[derive(Clone)]
pub struct MySqlPaymentRepository {
    pool: MySqlPool,
}

impl MySqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for MySqlPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<Payment> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, tracker, transaction_ref, buyer_id, item_id, seller_id, amount,
                currency, seller_type, seller_amount, platform_amount,
                commission_percentage, status, earnings_status, gateway_response,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.tracker)
        .bind(&payment.transaction_ref)
        .bind(&payment.buyer_id)
        .bind(&payment.item_id)
        .bind(&payment.seller_id)
        .bind(payment.amount)
        .bind(payment.currency.to_string())
        .bind(payment.seller_type.as_str())
        .bind(payment.commission.seller_amount)
        .bind(payment.commission.platform_amount)
        .bind(payment.commission.commission_percentage)
        .bind(payment.status.as_str())
        .bind(payment.earnings_status.map(|s| s.as_str()))
        .bind(payment.gateway_response.clone().map(Json))
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::internal(format!(
                        "Payment with tracker '{}' already exists",
                        payment.tracker
                    ));
                }
            }
            AppError::Database(e)
        })?;

        self.find_by_id(&payment.id)
            .await?
            .ok_or_else(|| AppError::internal("Payment was created but not found"))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_tracker(&self, tracker: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE tracker = ?",
            PAYMENT_COLUMNS
        ))
        .bind(tracker)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn mark_failed(
        &self,
        id: &str,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                gateway_response = COALESCE(?, gateway_response),
                updated_at = NOW()
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(PaymentStatus::Failed.as_str())
        .bind(gateway_response.map(Json))
        .bind(id)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn claim_earnings(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET earnings_status = ?, updated_at = NOW()
            WHERE id = ? AND status = ? AND earnings_status IS NULL
            "#,
        )
        .bind(EarningsStatus::Processing.as_str())
        .bind(id)
        .bind(PaymentStatus::Success.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_earnings(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET earnings_status = NULL, updated_at = NOW()
            WHERE id = ? AND earnings_status = ?
            "#,
        )
        .bind(id)
        .bind(EarningsStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_earnings_processed(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET earnings_status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(EarningsStatus::Processed.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_pending_earnings(&self, limit: u32) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {} FROM payments
            WHERE status = 'success' AND earnings_status IS NULL
            ORDER BY updated_at
            LIMIT ?
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
