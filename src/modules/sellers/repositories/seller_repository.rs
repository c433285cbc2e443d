use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::sellers::models::{Seller, SellerRow};

pub(crate) const SELLER_COLUMNS: &str = r#"
    id, name, email, seller_type, available_balance, total_earnings,
    total_withdrawn, last_payout_date, auto_payout, payout_method,
    jazzcash_number, jazzcash_verified, easypaisa_number, easypaisa_verified,
    bank_account_title, bank_account_number, bank_name, bank_iban, bank_verified,
    safepay_recipient_id, safepay_verified
"#;

/// Read access to seller wallets plus the earnings credit.
///
/// Balance decrements after a payout happen inside the payout completion
/// transaction, not here.
#[async_trait]
pub trait SellerRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Seller>>;

    /// Sellers with auto-payout on and at least `minimum` available
    async fn find_auto_payout_candidates(&self, minimum: Decimal) -> Result<Vec<Seller>>;

    /// Add a sale's seller share to the wallet
    async fn credit_earnings(&self, seller_id: &str, amount: Decimal) -> Result<()>;
}

/// MySQL-backed seller repository
#[derive(Clone)]
pub struct MySqlSellerRepository {
    pool: MySqlPool,
}

impl MySqlSellerRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SellerRepository for MySqlSellerRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Seller>> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "SELECT {} FROM sellers WHERE id = ?",
            SELLER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Seller::try_from).transpose()
    }

    async fn find_auto_payout_candidates(&self, minimum: Decimal) -> Result<Vec<Seller>> {
        let rows = sqlx::query_as::<_, SellerRow>(&format!(
            r#"
            SELECT {} FROM sellers
            WHERE auto_payout = TRUE AND available_balance >= ?
            ORDER BY available_balance DESC
            "#,
            SELLER_COLUMNS
        ))
        .bind(minimum)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Seller::try_from).collect()
    }

    async fn credit_earnings(&self, seller_id: &str, amount: Decimal) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sellers
            SET available_balance = available_balance + ?,
                total_earnings = total_earnings + ?,
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(amount)
        .bind(amount)
        .bind(seller_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Seller '{}' not found",
                seller_id
            )));
        }

        Ok(())
    }
}
