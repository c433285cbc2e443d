use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::core::{AppError, Currency, Result};
use crate::modules::commissions::CommissionSplit;
use crate::modules::sellers::SellerType;

/// Checkout attempt status.
///
/// Pending is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Downstream earnings bookkeeping marker; unset until a worker claims it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarningsStatus {
    /// Claimed by one worker; distribution in flight
    Processing,
    Processed,
}

impl EarningsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarningsStatus::Processing => "processing",
            EarningsStatus::Processed => "processed",
        }
    }
}

impl std::str::FromStr for EarningsStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "processing" => Ok(EarningsStatus::Processing),
            "processed" => Ok(EarningsStatus::Processed),
            _ => Err(format!("Invalid earnings status: {}", s)),
        }
    }
}

/// Human-traceable local reference, e.g. `LB-20260118093015-3F9A1C2B`
pub fn generate_transaction_ref() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("LB-{}-{}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}

/// One checkout attempt, keyed for reconciliation by the gateway tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub tracker: String,
    pub transaction_ref: String,
    pub buyer_id: String,
    pub item_id: String,
    pub seller_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub seller_type: SellerType,
    pub commission: CommissionSplit,
    pub status: PaymentStatus,
    pub earnings_status: Option<EarningsStatus>,
    /// Raw provider payloads, kept for audit
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inputs for a new pending payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub tracker: String,
    pub transaction_ref: String,
    pub buyer_id: String,
    pub item_id: String,
    pub seller_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub seller_type: SellerType,
    pub commission: CommissionSplit,
    pub gateway_response: Option<serde_json::Value>,
}

impl Payment {
    /// Create a pending payment
    ///
    /// # Errors
    /// * `Validation` - Non-positive amount, empty tracker, or a split that does not add up
    pub fn new(input: NewPayment) -> Result<Self> {
        input
            .currency
            .validate_amount(input.amount)
            .map_err(AppError::validation)?;

        if input.tracker.trim().is_empty() {
            return Err(AppError::validation("Gateway tracker cannot be empty"));
        }

        if input.commission.total() != input.amount {
            return Err(AppError::validation(format!(
                "Commission split {} does not match amount {}",
                input.commission.total(),
                input.amount
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracker: input.tracker,
            transaction_ref: input.transaction_ref,
            buyer_id: input.buyer_id,
            item_id: input.item_id,
            seller_id: input.seller_id,
            amount: input.amount,
            currency: input.currency,
            seller_type: input.seller_type,
            commission: input.commission,
            status: PaymentStatus::Pending,
            earnings_status: None,
            gateway_response: input.gateway_response,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == PaymentStatus::Success
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: String,
    pub tracker: String,
    pub transaction_ref: String,
    pub buyer_id: String,
    pub item_id: String,
    pub seller_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub seller_type: String,
    pub seller_amount: Decimal,
    pub platform_amount: Decimal,
    pub commission_percentage: Decimal,
    pub status: String,
    pub earnings_status: Option<String>,
    pub gateway_response: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Payment {
            currency: row.currency.parse().map_err(AppError::Internal)?,
            seller_type: row.seller_type.parse().map_err(AppError::Internal)?,
            status: row.status.parse().map_err(AppError::Internal)?,
            earnings_status: row
                .earnings_status
                .map(|s| s.parse())
                .transpose()
                .map_err(AppError::Internal)?,
            commission: CommissionSplit {
                seller_amount: row.seller_amount,
                platform_amount: row.platform_amount,
                commission_percentage: row.commission_percentage,
            },
            gateway_response: row.gateway_response.map(|json| json.0),
            id: row.id,
            tracker: row.tracker,
            transaction_ref: row.transaction_ref,
            buyer_id: row.buyer_id,
            item_id: row.item_id,
            seller_id: row.seller_id,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
