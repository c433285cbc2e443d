use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};
use crate::modules::sellers::SellerType;

/// Revenue split of one sale between seller and platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub seller_amount: Decimal,
    pub platform_amount: Decimal,
    /// Platform share, in percent
    pub commission_percentage: Decimal,
}

impl CommissionSplit {
    pub fn total(&self) -> Decimal {
        self.seller_amount + self.platform_amount
    }
}

/// Commission lifecycle. Only ever moves Processed -> PaidOut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Processed,
    PaidOut,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Processed => "processed",
            CommissionStatus::PaidOut => "paid_out",
        }
    }
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommissionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "processed" => Ok(CommissionStatus::Processed),
            "paid_out" => Ok(CommissionStatus::PaidOut),
            _ => Err(format!("Invalid commission status: {}", s)),
        }
    }
}

/// One revenue-split record tied to a completed purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commission {
    pub id: String,
    pub payment_id: String,
    pub purchase_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub seller_type: SellerType,
    pub total_amount: Decimal,
    pub seller_amount: Decimal,
    pub platform_amount: Decimal,
    pub commission_percentage: Decimal,
    pub status: CommissionStatus,
    pub payout_id: Option<String>,
    pub paid_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Commission {
    pub fn new(
        payment_id: String,
        purchase_id: String,
        buyer_id: String,
        seller_id: String,
        seller_type: SellerType,
        total_amount: Decimal,
        split: CommissionSplit,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payment_id,
            purchase_id,
            buyer_id,
            seller_id,
            seller_type,
            total_amount,
            seller_amount: split.seller_amount,
            platform_amount: split.platform_amount,
            commission_percentage: split.commission_percentage,
            status: CommissionStatus::Processed,
            payout_id: None,
            paid_out_at: None,
            created_at: Utc::now(),
        }
    }

    /// Unlinked and unpaid, so a payout run may claim it
    pub fn is_payable(&self) -> bool {
        self.status == CommissionStatus::Processed && self.payout_id.is_none()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommissionRow {
    pub id: String,
    pub payment_id: String,
    pub purchase_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub seller_type: String,
    pub total_amount: Decimal,
    pub seller_amount: Decimal,
    pub platform_amount: Decimal,
    pub commission_percentage: Decimal,
    pub status: String,
    pub payout_id: Option<String>,
    pub paid_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CommissionRow> for Commission {
    type Error = AppError;

    fn try_from(row: CommissionRow) -> Result<Self> {
        Ok(Commission {
            seller_type: row.seller_type.parse().map_err(AppError::Internal)?,
            status: row.status.parse().map_err(AppError::Internal)?,
            id: row.id,
            payment_id: row.payment_id,
            purchase_id: row.purchase_id,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            total_amount: row.total_amount,
            seller_amount: row.seller_amount,
            platform_amount: row.platform_amount,
            commission_percentage: row.commission_percentage,
            payout_id: row.payout_id,
            paid_out_at: row.paid_out_at,
            created_at: row.created_at,
        })
    }
}
