use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::commissions::models::{Commission, CommissionRow};

pub(crate) const COMMISSION_COLUMNS: &str = r#"
    id, payment_id, purchase_id, buyer_id, seller_id, seller_type,
    total_amount, seller_amount, platform_amount, commission_percentage,
    status, payout_id, paid_out_at, created_at
"#;

/// Read side of the commission ledger.
///
/// Commissions are written together with their purchase (see
/// `PurchaseRepository::record_settlement`) and mutated only by payout
/// transactions (see `PayoutRepository`).
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    async fn find_by_purchase(&self, purchase_id: &str) -> Result<Option<Commission>>;

    async fn find_by_payout(&self, payout_id: &str) -> Result<Vec<Commission>>;
}

#[derive(Clone)]
pub struct MySqlCommissionRepository {
    pool: MySqlPool,
}

impl MySqlCommissionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommissionRepository for MySqlCommissionRepository {
    async fn find_by_purchase(&self, purchase_id: &str) -> Result<Option<Commission>> {
        let row = sqlx::query_as::<_, CommissionRow>(&format!(
            "SELECT {} FROM commissions WHERE purchase_id = ?",
            COMMISSION_COLUMNS
        ))
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Commission::try_from).transpose()
    }

    async fn find_by_payout(&self, payout_id: &str) -> Result<Vec<Commission>> {
        let rows = sqlx::query_as::<_, CommissionRow>(&format!(
            "SELECT {} FROM commissions WHERE payout_id = ? ORDER BY created_at",
            COMMISSION_COLUMNS
        ))
        .bind(payout_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Commission::try_from).collect()
    }
}
