use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::core::{AppError, Currency, Result};
use crate::modules::sellers::{PayoutMethod, RecipientDetails};

/// Payout lifecycle. Processing is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "processing" => Ok(PayoutStatus::Processing),
            "completed" => Ok(PayoutStatus::Completed),
            "failed" => Ok(PayoutStatus::Failed),
            _ => Err(format!("Invalid payout status: {}", s)),
        }
    }
}

/// Internal payout reference: PO-YYYYMMDD-XXXXXXXX
pub fn generate_payout_reference() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("PO-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

/// One transfer of reserved commissions to a seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub seller_id: String,
    /// Sum of the seller share of the reserved commissions
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PayoutMethod,
    /// Snapshot taken when the payout was opened
    pub recipient_details: RecipientDetails,
    pub status: PayoutStatus,
    pub reference: String,
    pub external_reference: Option<String>,
    pub commission_ids: Vec<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payout {
    /// A processing payout with nothing reserved yet
    pub fn open(
        seller_id: &str,
        payment_method: PayoutMethod,
        recipient_details: RecipientDetails,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            seller_id: seller_id.to_string(),
            amount: Decimal::ZERO,
            currency,
            payment_method,
            recipient_details,
            status: PayoutStatus::Processing,
            reference: generate_payout_reference(),
            external_reference: None,
            commission_ids: Vec::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.status == PayoutStatus::Processing
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PayoutRow {
    pub id: String,
    pub seller_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub recipient_details: Json<RecipientDetails>,
    pub status: String,
    pub reference: String,
    pub external_reference: Option<String>,
    pub commission_ids: Json<Vec<String>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PayoutRow> for Payout {
    type Error = AppError;

    fn try_from(row: PayoutRow) -> Result<Self> {
        Ok(Payout {
            currency: row.currency.parse().map_err(AppError::Internal)?,
            payment_method: row.payment_method.parse().map_err(AppError::Internal)?,
            status: row.status.parse().map_err(AppError::Internal)?,
            recipient_details: row.recipient_details.0,
            commission_ids: row.commission_ids.0,
            id: row.id,
            seller_id: row.seller_id,
            amount: row.amount,
            reference: row.reference,
            external_reference: row.external_reference,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

/// Seller balance after a completed payout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDebit {
    pub remaining: Decimal,
    /// How far the payout exceeded the available balance, if at all
    pub shortfall: Option<Decimal>,
}

/// Take `amount` out of `available`. The balance never goes negative; the
/// gap is reported so the caller can flag the mismatch.
pub fn debit_balance(available: Decimal, amount: Decimal) -> BalanceDebit {
    if amount <= available {
        BalanceDebit {
            remaining: available - amount,
            shortfall: None,
        }
    } else {
        BalanceDebit {
            remaining: Decimal::ZERO,
            shortfall: Some(amount - available),
        }
    }
}
