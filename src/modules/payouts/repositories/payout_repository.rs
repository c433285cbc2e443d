use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::MySqlPool;
use tracing::warn;

use crate::core::{AppError, Result};
use crate::modules::commissions::models::{Commission, CommissionRow, CommissionStatus};
use crate::modules::commissions::repositories::commission_repository::COMMISSION_COLUMNS;
use crate::modules::payouts::models::{debit_balance, Payout, PayoutRow, PayoutStatus};

const PAYOUT_COLUMNS: &str = r#"
    id, seller_id, amount, currency, payment_method, recipient_details, status,
    reference, external_reference, commission_ids, failure_reason,
    created_at, updated_at, completed_at
"#;

/// Payout ledger. Every state change here also moves the linked commissions.
#[async_trait]
pub trait PayoutRepository: Send + Sync {
    /// Insert `payout` and reserve up to `batch_cap` unlinked processed
    /// commissions of its seller, atomically.
    ///
    /// The stored amount is the sum of what was actually reserved. Returns
    /// `None`, and stores nothing, when there was nothing to reserve.
    async fn open_batch(
        &self,
        payout: &Payout,
        batch_cap: u32,
    ) -> Result<Option<(Payout, Vec<Commission>)>>;

    /// Processing -> Completed. Marks the reserved commissions paid out and
    /// moves the amount from the seller's available balance to withdrawn.
    async fn complete(&self, payout_id: &str, external_reference: &str) -> Result<Payout>;

    /// Processing -> Failed. Releases the reserved commissions.
    async fn fail(&self, payout_id: &str, reason: &str) -> Result<Payout>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Payout>>;

    async fn list_for_seller(&self, seller_id: &str, limit: u32) -> Result<Vec<Payout>>;
}

#[derive(Clone)]
pub struct MySqlPayoutRepository {
    pool: MySqlPool,
}

impl MySqlPayoutRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &str) -> Result<Payout> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payout '{}' not found", id)))
    }
}

/// Lock a payout row and check it is still processing
async fn lock_processing(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    payout_id: &str,
) -> Result<(String, Decimal)> {
    let row: Option<(String, Decimal, String)> =
        sqlx::query_as("SELECT seller_id, amount, status FROM payouts WHERE id = ? FOR UPDATE")
            .bind(payout_id)
            .fetch_optional(&mut **tx)
            .await?;

    let (seller_id, amount, status) =
        row.ok_or_else(|| AppError::not_found(format!("Payout '{}' not found", payout_id)))?;

    if status != PayoutStatus::Processing.as_str() {
        return Err(AppError::validation(format!(
            "Payout '{}' is already {}",
            payout_id, status
        )));
    }

    Ok((seller_id, amount))
}

#[async_trait]
impl PayoutRepository for MySqlPayoutRepository {
    async fn open_batch(
        &self,
        payout: &Payout,
        batch_cap: u32,
    ) -> Result<Option<(Payout, Vec<Commission>)>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payouts (
                id, seller_id, amount, currency, payment_method, recipient_details,
                status, reference, external_reference, commission_ids, failure_reason,
                created_at, updated_at, completed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, NULL, ?, ?, NULL)
            "#,
        )
        .bind(&payout.id)
        .bind(&payout.seller_id)
        .bind(Decimal::ZERO)
        .bind(payout.currency.to_string())
        .bind(payout.payment_method.as_str())
        .bind(Json(&payout.recipient_details))
        .bind(PayoutStatus::Processing.as_str())
        .bind(&payout.reference)
        .bind(Json(Vec::<String>::new()))
        .bind(payout.created_at)
        .bind(payout.updated_at)
        .execute(&mut *tx)
        .await?;

        // Conditional claim: rows another run already linked are skipped
        sqlx::query(
            r#"
            UPDATE commissions
            SET payout_id = ?
            WHERE seller_id = ? AND status = ? AND payout_id IS NULL
            ORDER BY created_at
            LIMIT ?
            "#,
        )
        .bind(&payout.id)
        .bind(&payout.seller_id)
        .bind(CommissionStatus::Processed.as_str())
        .bind(batch_cap)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query_as::<_, CommissionRow>(&format!(
            "SELECT {} FROM commissions WHERE payout_id = ? ORDER BY created_at",
            COMMISSION_COLUMNS
        ))
        .bind(&payout.id)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let commissions = rows
            .into_iter()
            .map(Commission::try_from)
            .collect::<Result<Vec<_>>>()?;

        let amount: Decimal = commissions.iter().map(|c| c.seller_amount).sum();
        let commission_ids: Vec<String> = commissions.iter().map(|c| c.id.clone()).collect();

        sqlx::query("UPDATE payouts SET amount = ?, commission_ids = ? WHERE id = ?")
            .bind(amount)
            .bind(Json(&commission_ids))
            .bind(&payout.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut opened = payout.clone();
        opened.amount = amount;
        opened.commission_ids = commission_ids;

        Ok(Some((opened, commissions)))
    }

    async fn complete(&self, payout_id: &str, external_reference: &str) -> Result<Payout> {
        let mut tx = self.pool.begin().await?;

        let (seller_id, amount) = lock_processing(&mut tx, payout_id).await?;

        sqlx::query(
            r#"
            UPDATE payouts
            SET status = ?, external_reference = ?, completed_at = NOW(), updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(PayoutStatus::Completed.as_str())
        .bind(external_reference)
        .bind(payout_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE commissions
            SET status = ?, paid_out_at = NOW()
            WHERE payout_id = ? AND status = ?
            "#,
        )
        .bind(CommissionStatus::PaidOut.as_str())
        .bind(payout_id)
        .bind(CommissionStatus::Processed.as_str())
        .execute(&mut *tx)
        .await?;

        let available: Option<Decimal> =
            sqlx::query_scalar("SELECT available_balance FROM sellers WHERE id = ? FOR UPDATE")
                .bind(&seller_id)
                .fetch_optional(&mut *tx)
                .await?;

        match available {
            Some(available) => {
                let debit = debit_balance(available, amount);
                if let Some(shortfall) = debit.shortfall {
                    warn!(
                        payout_id = %payout_id,
                        seller_id = %seller_id,
                        available = %available,
                        payout_amount = %amount,
                        shortfall = %shortfall,
                        "Payout exceeds available balance; ledger mismatch"
                    );
                }

                sqlx::query(
                    r#"
                    UPDATE sellers
                    SET available_balance = ?,
                        total_withdrawn = total_withdrawn + ?,
                        last_payout_date = NOW(),
                        updated_at = NOW()
                    WHERE id = ?
                    "#,
                )
                .bind(debit.remaining)
                .bind(amount)
                .bind(&seller_id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                warn!(
                    payout_id = %payout_id,
                    seller_id = %seller_id,
                    "Completed payout for a seller that no longer exists"
                );
            }
        }

        tx.commit().await?;

        self.fetch(payout_id).await
    }

    async fn fail(&self, payout_id: &str, reason: &str) -> Result<Payout> {
        let mut tx = self.pool.begin().await?;

        lock_processing(&mut tx, payout_id).await?;

        sqlx::query(
            r#"
            UPDATE payouts
            SET status = ?, failure_reason = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(PayoutStatus::Failed.as_str())
        .bind(reason)
        .bind(payout_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE commissions
            SET payout_id = NULL
            WHERE payout_id = ? AND status = ?
            "#,
        )
        .bind(payout_id)
        .bind(CommissionStatus::Processed.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.fetch(payout_id).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payout>> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {} FROM payouts WHERE id = ?",
            PAYOUT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payout::try_from).transpose()
    }

    async fn list_for_seller(&self, seller_id: &str, limit: u32) -> Result<Vec<Payout>> {
        let rows = sqlx::query_as::<_, PayoutRow>(&format!(
            r#"
            SELECT {} FROM payouts
            WHERE seller_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(seller_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payout::try_from).collect()
    }
}
