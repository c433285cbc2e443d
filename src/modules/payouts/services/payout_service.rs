use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::notifier::PayoutNotifier;
use super::rails::{PayoutContext, RailRegistry, TransferOutcome};
use crate::config::PayoutConfig;
use crate::core::{AppError, Currency, Result};
use crate::modules::payouts::models::Payout;
use crate::modules::payouts::repositories::PayoutRepository;
use crate::modules::sellers::SellerRepository;

/// How a settlement run for one seller ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutRunStatus {
    Completed,
    NotEnabled,
    BelowMinimum,
    Unverified,
    NothingToPay,
    ManualRequired,
    Failed,
    Error,
}

/// Per-seller settlement result
#[derive(Debug, Clone, Serialize)]
pub struct PayoutResult {
    pub seller_id: String,
    pub success: bool,
    pub status: PayoutRunStatus,
    pub message: String,
    pub amount: Option<Decimal>,
    pub payout_id: Option<String>,
}

impl PayoutResult {
    fn skipped(seller_id: &str, status: PayoutRunStatus, message: String) -> Self {
        Self {
            seller_id: seller_id.to_string(),
            success: false,
            status,
            message,
            amount: None,
            payout_id: None,
        }
    }

    fn for_payout(payout: &Payout, success: bool, status: PayoutRunStatus, message: String) -> Self {
        Self {
            seller_id: payout.seller_id.clone(),
            success,
            status,
            message,
            amount: Some(payout.amount),
            payout_id: Some(payout.id.clone()),
        }
    }
}

/// Sweeps seller balances into payouts over the configured rails
pub struct PayoutService {
    seller_repo: Arc<dyn SellerRepository>,
    payout_repo: Arc<dyn PayoutRepository>,
    rails: RailRegistry,
    notifier: Arc<dyn PayoutNotifier>,
    config: PayoutConfig,
    currency: Currency,
}

impl PayoutService {
    pub fn new(
        seller_repo: Arc<dyn SellerRepository>,
        payout_repo: Arc<dyn PayoutRepository>,
        rails: RailRegistry,
        notifier: Arc<dyn PayoutNotifier>,
        config: PayoutConfig,
        currency: Currency,
    ) -> Self {
        Self {
            seller_repo,
            payout_repo,
            rails,
            notifier,
            config,
            currency,
        }
    }

    /// Settle one seller
    ///
    /// Not-enabled, below-minimum, unverified and empty batches are results,
    /// not errors.
    ///
    /// # Errors
    /// * `NotFound` - Seller does not exist
    /// * `Database` - Storage failure
    pub async fn process_auto_payout_for(&self, seller_id: &str) -> Result<PayoutResult> {
        let seller = self
            .seller_repo
            .find_by_id(seller_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Seller '{}' not found", seller_id)))?;

        if !seller.payout_settings.auto_payout {
            return Ok(PayoutResult::skipped(
                seller_id,
                PayoutRunStatus::NotEnabled,
                "Auto payout is not enabled".to_string(),
            ));
        }

        if seller.available_balance < self.config.minimum_amount {
            return Ok(PayoutResult::skipped(
                seller_id,
                PayoutRunStatus::BelowMinimum,
                format!(
                    "Available balance {} is below the minimum payout amount of {}",
                    self.currency.format_amount(seller.available_balance),
                    self.currency.format_amount(self.config.minimum_amount)
                ),
            ));
        }

        let method = seller.payout_settings.payout_method;
        let Some(recipient) = seller.verified_recipient() else {
            return Ok(PayoutResult::skipped(
                seller_id,
                PayoutRunStatus::Unverified,
                format!("Payout method {} is not verified", method),
            ));
        };

        let draft = Payout::open(seller_id, method, recipient, self.currency);
        let Some((payout, commissions)) = self
            .payout_repo
            .open_batch(&draft, self.config.batch_cap)
            .await?
        else {
            return Ok(PayoutResult::skipped(
                seller_id,
                PayoutRunStatus::NothingToPay,
                "No unpaid commissions to pay out".to_string(),
            ));
        };

        info!(
            seller_id = %seller_id,
            payout_id = %payout.id,
            reference = %payout.reference,
            amount = %payout.amount,
            commissions = commissions.len(),
            method = %method,
            "Payout opened"
        );

        let context = PayoutContext {
            payout_id: payout.id.clone(),
            reference: payout.reference.clone(),
            seller_id: seller_id.to_string(),
            currency: payout.currency,
        };

        let outcome = self
            .rails
            .dispatch(method, &payout.recipient_details, payout.amount, &context)
            .await;

        match outcome {
            TransferOutcome::Completed { external_ref } => {
                let completed = match self.payout_repo.complete(&payout.id, &external_ref).await {
                    Ok(completed) => completed,
                    Err(e) => {
                        error!(
                            payout_id = %payout.id,
                            external_ref = %external_ref,
                            error = %e,
                            "Rail transfer succeeded but payout could not be completed; finalize manually"
                        );
                        return Err(e);
                    }
                };

                if let Err(e) = self.notifier.payout_completed(&seller, &completed).await {
                    warn!(payout_id = %completed.id, error = %e, "Payout notification failed");
                }

                info!(
                    seller_id = %seller_id,
                    payout_id = %completed.id,
                    external_ref = %external_ref,
                    "Payout completed"
                );

                Ok(PayoutResult::for_payout(
                    &completed,
                    true,
                    PayoutRunStatus::Completed,
                    format!(
                        "Payout of {} completed",
                        completed.currency.format_amount(completed.amount)
                    ),
                ))
            }
            TransferOutcome::Failed { reason } => {
                let failed = self.payout_repo.fail(&payout.id, &reason).await?;
                warn!(
                    seller_id = %seller_id,
                    payout_id = %failed.id,
                    reason = %reason,
                    "Payout failed; commissions released"
                );
                Ok(PayoutResult::for_payout(
                    &failed,
                    false,
                    PayoutRunStatus::Failed,
                    reason,
                ))
            }
            TransferOutcome::ManualRequired { reason } => {
                info!(
                    seller_id = %seller_id,
                    payout_id = %payout.id,
                    reason = %reason,
                    "Payout awaiting manual transfer"
                );
                Ok(PayoutResult::for_payout(
                    &payout,
                    false,
                    PayoutRunStatus::ManualRequired,
                    reason,
                ))
            }
        }
    }

    /// Settle every eligible seller. One seller's error never stops the sweep.
    pub async fn process_all_auto_payouts(&self) -> Result<Vec<PayoutResult>> {
        let sellers = self
            .seller_repo
            .find_auto_payout_candidates(self.config.minimum_amount)
            .await?;

        let mut results = Vec::with_capacity(sellers.len());
        for seller in sellers {
            let result = match self.process_auto_payout_for(&seller.id).await {
                Ok(result) => result,
                Err(e) => {
                    error!(seller_id = %seller.id, error = %e, "Seller settlement failed");
                    PayoutResult::skipped(&seller.id, PayoutRunStatus::Error, e.to_string())
                }
            };
            results.push(result);
        }

        let completed = results.iter().filter(|r| r.success).count();
        info!(
            sellers = results.len(),
            completed = completed,
            "Payout sweep finished"
        );

        Ok(results)
    }

    /// Record a transfer an operator made by hand
    pub async fn complete_manual(&self, payout_id: &str, external_reference: &str) -> Result<Payout> {
        if external_reference.trim().is_empty() {
            return Err(AppError::validation("external_reference is required"));
        }

        let payout = self.payout_repo.complete(payout_id, external_reference).await?;
        info!(payout_id = %payout.id, external_ref = %external_reference, "Manual payout completed");

        if let Some(seller) = self.seller_repo.find_by_id(&payout.seller_id).await? {
            if let Err(e) = self.notifier.payout_completed(&seller, &payout).await {
                warn!(payout_id = %payout.id, error = %e, "Payout notification failed");
            }
        }

        Ok(payout)
    }

    /// Give up on a processing payout and release its commissions
    pub async fn fail_manual(&self, payout_id: &str, reason: &str) -> Result<Payout> {
        if reason.trim().is_empty() {
            return Err(AppError::validation("reason is required"));
        }

        let payout = self.payout_repo.fail(payout_id, reason).await?;
        info!(payout_id = %payout.id, reason = %reason, "Payout marked failed by operator");

        Ok(payout)
    }

    pub async fn get_payout(&self, payout_id: &str) -> Result<Payout> {
        self.payout_repo
            .find_by_id(payout_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payout '{}' not found", payout_id)))
    }

    pub async fn list_seller_payouts(&self, seller_id: &str, limit: u32) -> Result<Vec<Payout>> {
        self.payout_repo.list_for_seller(seller_id, limit).await
    }
}
