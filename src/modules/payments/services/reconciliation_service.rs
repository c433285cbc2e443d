use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::earnings::EarningsDistributor;
use crate::core::{AppError, Currency, Result};
use crate::modules::commissions::{Commission, CommissionRepository, CommissionSplit};
use crate::modules::gateways::{PaymentGateway, SettlementStatus, WebhookEventStatus};
use crate::modules::payments::models::{EarningsStatus, Payment, PaymentStatus};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::purchases::{Purchase, PurchaseRepository, Settlement, SettlementWrite};

/// Result of reconciling one tracker against an authoritative paid flag
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationOutcome {
    pub success: bool,
    pub payment: Payment,
    pub purchase: Option<Purchase>,
    pub commission: Option<Commission>,
    /// True when this call changed nothing
    pub already_processed: bool,
}

/// Query string of the gateway redirect back to us
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnQuery {
    pub tracker: Option<String>,
    /// Provider-asserted status. Advisory only.
    pub status: Option<String>,
    pub cancel: Option<String>,
}

impl ReturnQuery {
    fn is_cancelled(&self) -> bool {
        matches!(self.cancel.as_deref(), Some("true") | Some("1"))
    }
}

/// Ways a buyer can land back on the return page
#[derive(Debug, Clone)]
pub enum ReturnOutcome {
    Cancelled,
    MissingTracker,
    PaymentNotFound { tracker: String },
    ProcessingError { payment: Payment, message: String },
    /// Provider has not reached a final state. The payment stays pending.
    AwaitingConfirmation { payment: Payment },
    Confirmed(Box<ReconciliationOutcome>),
    Declined(Box<ReconciliationOutcome>),
}

/// Body returned to the gateway for every signature-valid delivery
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookAck {
    fn processed() -> Self {
        Self {
            received: true,
            processed: true,
            message: None,
        }
    }

    fn ignored(message: impl Into<String>) -> Self {
        Self {
            received: true,
            processed: false,
            message: Some(message.into()),
        }
    }
}

/// Read-only view of a payment for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub id: String,
    pub tracker: String,
    pub transaction_ref: String,
    pub item_id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub commission_breakdown: CommissionSplit,
    pub earnings_status: Option<EarningsStatus>,
    pub purchase_id: Option<String>,
}

/// Converges the return path and the webhook on one idempotent state machine
pub struct ReconciliationService {
    payment_repo: Arc<dyn PaymentRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    commission_repo: Arc<dyn CommissionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    earnings: Arc<dyn EarningsDistributor>,
}

impl ReconciliationService {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        purchase_repo: Arc<dyn PurchaseRepository>,
        commission_repo: Arc<dyn CommissionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        earnings: Arc<dyn EarningsDistributor>,
    ) -> Self {
        Self {
            payment_repo,
            purchase_repo,
            commission_repo,
            gateway,
            earnings,
        }
    }

    /// Apply an authoritative paid/not-paid verdict to the payment behind `tracker`
    ///
    /// # Errors
    /// * `NotFound` - No payment for this tracker
    /// * `Database` - Storage failure
    pub async fn reconcile(
        &self,
        tracker: &str,
        is_paid: bool,
        gateway_response: serde_json::Value,
    ) -> Result<ReconciliationOutcome> {
        let payment = self.find_payment(tracker).await?;

        match payment.status {
            PaymentStatus::Success => self.settled_outcome(payment).await,
            PaymentStatus::Failed => {
                if is_paid {
                    error!(
                        payment_id = %payment.id,
                        tracker = %tracker,
                        "Paid signal received for a failed payment; needs manual review"
                    );
                }
                self.settled_outcome(payment).await
            }
            PaymentStatus::Pending if !is_paid => {
                self.decline(payment, gateway_response).await
            }
            PaymentStatus::Pending => self.confirm(payment, gateway_response).await,
        }
    }

    async fn find_payment(&self, tracker: &str) -> Result<Payment> {
        self.payment_repo
            .find_by_tracker(tracker)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Payment for tracker '{}' not found", tracker))
            })
    }

    /// Outcome for a payment that has already left pending
    async fn settled_outcome(&self, payment: Payment) -> Result<ReconciliationOutcome> {
        let purchase = if payment.is_succeeded() {
            self.purchase_repo.find_by_payment(&payment.id).await?
        } else {
            None
        };

        let commission = match &purchase {
            Some(purchase) => self.commission_repo.find_by_purchase(&purchase.id).await?,
            None => None,
        };

        Ok(ReconciliationOutcome {
            success: payment.is_succeeded(),
            payment,
            purchase,
            commission,
            already_processed: true,
        })
    }

    async fn decline(
        &self,
        payment: Payment,
        gateway_response: serde_json::Value,
    ) -> Result<ReconciliationOutcome> {
        let changed = self
            .payment_repo
            .mark_failed(&payment.id, Some(gateway_response))
            .await?;

        let refreshed = self.find_payment(&payment.tracker).await?;
        if !changed {
            // Another confirmation won the race
            return self.settled_outcome(refreshed).await;
        }

        info!(
            payment_id = %refreshed.id,
            tracker = %refreshed.tracker,
            "Payment marked failed"
        );

        Ok(ReconciliationOutcome {
            success: false,
            payment: refreshed,
            purchase: None,
            commission: None,
            already_processed: false,
        })
    }

    async fn confirm(
        &self,
        mut payment: Payment,
        gateway_response: serde_json::Value,
    ) -> Result<ReconciliationOutcome> {
        payment.gateway_response = Some(gateway_response.clone());

        let purchase = Purchase::from_payment(&payment, self.gateway.name());
        let commission = Commission::new(
            payment.id.clone(),
            purchase.id.clone(),
            payment.buyer_id.clone(),
            payment.seller_id.clone(),
            payment.seller_type,
            payment.amount,
            payment.commission,
        );

        let write = self
            .purchase_repo
            .record_settlement(&Settlement {
                payment_id: payment.id.clone(),
                gateway_response,
                purchase,
                commission,
            })
            .await?;

        let refreshed = self.find_payment(&payment.tracker).await?;

        match write {
            SettlementWrite::Recorded {
                purchase,
                commission,
            } => {
                info!(
                    payment_id = %refreshed.id,
                    purchase_id = %purchase.id,
                    commission_id = %commission.id,
                    amount = %refreshed.amount,
                    "Payment confirmed and purchase recorded"
                );

                self.distribute_earnings(&refreshed, &purchase).await;

                let payment = self.find_payment(&refreshed.tracker).await?;
                Ok(ReconciliationOutcome {
                    success: true,
                    payment,
                    purchase: Some(purchase),
                    commission: Some(commission),
                    already_processed: false,
                })
            }
            SettlementWrite::AlreadyOwned { purchase } => {
                warn!(
                    payment_id = %refreshed.id,
                    existing_purchase_id = %purchase.id,
                    buyer_id = %refreshed.buyer_id,
                    item_id = %refreshed.item_id,
                    "Payment confirmed for an item the buyer already owns"
                );

                let commission = self.commission_repo.find_by_purchase(&purchase.id).await?;
                Ok(ReconciliationOutcome {
                    success: true,
                    payment: refreshed,
                    purchase: Some(purchase),
                    commission,
                    already_processed: true,
                })
            }
            SettlementWrite::NotPending(status) => {
                info!(
                    payment_id = %refreshed.id,
                    status = %status,
                    "Payment already settled by a concurrent confirmation"
                );
                self.settled_outcome(refreshed).await
            }
        }
    }

    /// Run downstream bookkeeping. Errors are logged, never returned.
    async fn distribute_earnings(&self, payment: &Payment, purchase: &Purchase) {
        match self.distribute_claimed(payment, purchase).await {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    payment_id = %payment.id,
                    "Earnings already claimed by another worker"
                );
            }
            Err(e) => {
                error!(
                    payment_id = %payment.id,
                    purchase_id = %purchase.id,
                    error = %e,
                    "Earnings distribution failed; left for retry"
                );
            }
        }
    }

    /// Credit earnings once per payment. Returns false when the claim was lost.
    ///
    /// A claim held past a failed `mark_earnings_processed` is never retried
    /// automatically, so a credit is never repeated.
    async fn distribute_claimed(&self, payment: &Payment, purchase: &Purchase) -> Result<bool> {
        if !self.payment_repo.claim_earnings(&payment.id).await? {
            return Ok(false);
        }

        if let Err(e) = self.earnings.distribute(payment, purchase).await {
            if let Err(release_err) = self.payment_repo.release_earnings(&payment.id).await {
                error!(
                    payment_id = %payment.id,
                    error = %release_err,
                    "Failed to release earnings claim"
                );
            }
            return Err(e);
        }

        self.payment_repo.mark_earnings_processed(&payment.id).await?;
        Ok(true)
    }

    /// Browser return path. Never trusts the query-string status.
    ///
    /// # Errors
    /// Only storage failures. Every business outcome is a `ReturnOutcome`.
    pub async fn handle_return(&self, query: &ReturnQuery) -> Result<ReturnOutcome> {
        if query.is_cancelled() {
            info!(tracker = ?query.tracker, "Checkout cancelled by buyer");
            return Ok(ReturnOutcome::Cancelled);
        }

        let Some(tracker) = query.tracker.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(ReturnOutcome::MissingTracker);
        };

        let Some(payment) = self.payment_repo.find_by_tracker(tracker).await? else {
            warn!(tracker = %tracker, "Return path hit for unknown tracker");
            return Ok(ReturnOutcome::PaymentNotFound {
                tracker: tracker.to_string(),
            });
        };

        if !payment.is_pending() {
            let outcome = self.settled_outcome(payment).await?;
            return Ok(Self::classify(outcome));
        }

        let settlement = match self.gateway.verify_settlement(tracker).await {
            Ok(settlement) => settlement,
            Err(e) => {
                error!(
                    tracker = %tracker,
                    advisory_status = ?query.status,
                    error = %e,
                    "Settlement verification failed on return path"
                );
                return Ok(ReturnOutcome::ProcessingError {
                    payment,
                    message: "We could not confirm your payment yet. If you were charged, it will be applied shortly.".to_string(),
                });
            }
        };

        let is_paid = match settlement.status {
            SettlementStatus::Paid => true,
            SettlementStatus::Failed => false,
            SettlementStatus::Pending => {
                info!(
                    tracker = %tracker,
                    state = %settlement.state,
                    "Tracker not settled yet; payment left pending"
                );
                return Ok(ReturnOutcome::AwaitingConfirmation { payment });
            }
        };

        match self.reconcile(tracker, is_paid, settlement.raw).await {
            Ok(outcome) => Ok(Self::classify(outcome)),
            Err(AppError::NotFound(_)) => Ok(ReturnOutcome::PaymentNotFound {
                tracker: tracker.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn classify(outcome: ReconciliationOutcome) -> ReturnOutcome {
        if outcome.success {
            ReturnOutcome::Confirmed(Box::new(outcome))
        } else {
            ReturnOutcome::Declined(Box::new(outcome))
        }
    }

    /// Gateway push path
    ///
    /// # Errors
    /// * `Unauthorized` - Signature missing or wrong. Nothing else escapes;
    ///   processing failures are logged and acknowledged.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck> {
        if !self.gateway.verify_webhook_signature(raw_body, signature) {
            warn!(
                signature_present = signature.is_some(),
                "Rejected webhook with invalid signature"
            );
            return Err(AppError::unauthorized("Invalid webhook signature"));
        }

        let payload: serde_json::Value = match serde_json::from_slice(raw_body) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Webhook body is not valid JSON");
                return Ok(WebhookAck::ignored("Malformed payload"));
            }
        };

        let event = match self.gateway.parse_webhook_event(&payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "Webhook event could not be parsed");
                return Ok(WebhookAck::ignored("Unrecognized event"));
            }
        };

        let is_paid = match event.status {
            WebhookEventStatus::Paid => true,
            WebhookEventStatus::Failed => false,
            WebhookEventStatus::Unknown => {
                info!(
                    tracker = %event.tracker,
                    event_type = %event.event_type,
                    "Ignoring webhook event"
                );
                return Ok(WebhookAck::ignored("Event ignored"));
            }
        };

        match self.reconcile(&event.tracker, is_paid, payload).await {
            Ok(outcome) if is_paid && !outcome.success => {
                warn!(
                    tracker = %event.tracker,
                    event_type = %event.event_type,
                    "Paid webhook not applied to a failed payment"
                );
                Ok(WebhookAck::ignored("Payment already failed"))
            }
            Ok(outcome) => {
                info!(
                    tracker = %event.tracker,
                    event_type = %event.event_type,
                    success = outcome.success,
                    already_processed = outcome.already_processed,
                    "Webhook reconciled"
                );
                Ok(WebhookAck::processed())
            }
            Err(e) => {
                error!(
                    tracker = %event.tracker,
                    event_type = %event.event_type,
                    error = %e,
                    "Webhook reconciliation failed"
                );
                Ok(WebhookAck::ignored("Processing failed"))
            }
        }
    }

    /// Re-run earnings distribution for settled payments that missed it
    ///
    /// Returns how many payments were brought up to date.
    pub async fn retry_pending_earnings(&self, limit: u32) -> Result<usize> {
        let payments = self.payment_repo.find_pending_earnings(limit).await?;
        let mut processed = 0;

        for payment in payments {
            let Some(purchase) = self.purchase_repo.find_by_payment(&payment.id).await? else {
                warn!(
                    payment_id = %payment.id,
                    "Settled payment has no purchase; skipping earnings retry"
                );
                continue;
            };

            match self.distribute_claimed(&payment, &purchase).await {
                Ok(true) => processed += 1,
                Ok(false) => {
                    info!(payment_id = %payment.id, "Earnings claimed elsewhere; skipping");
                }
                Err(e) => {
                    warn!(payment_id = %payment.id, error = %e, "Earnings retry failed");
                }
            }
        }

        Ok(processed)
    }

    /// Payment status for its buyer. Admins may read any payment.
    pub async fn get_payment_status(
        &self,
        payment_id: &str,
        requester_id: &str,
        is_admin: bool,
    ) -> Result<PaymentStatusView> {
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        if !is_admin && payment.buyer_id != requester_id {
            // Same answer as a missing payment
            return Err(AppError::not_found(format!(
                "Payment '{}' not found",
                payment_id
            )));
        }

        let purchase_id = if payment.is_succeeded() {
            self.purchase_repo
                .find_by_payment(&payment.id)
                .await?
                .map(|p| p.id)
        } else {
            None
        };

        Ok(PaymentStatusView {
            id: payment.id,
            tracker: payment.tracker,
            transaction_ref: payment.transaction_ref,
            item_id: payment.item_id,
            status: payment.status,
            amount: payment.amount,
            currency: payment.currency,
            commission_breakdown: payment.commission,
            earnings_status: payment.earnings_status,
            purchase_id,
        })
    }
}
