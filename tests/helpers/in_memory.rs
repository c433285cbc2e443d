// In-memory stores behind the repository traits.
//
// Each write that the MySQL implementation does in one transaction is done
// here under one lock, so interleaving tests exercise the same guarantees.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use lawbook_payments::core::{AppError, Result};
use lawbook_payments::modules::catalog::{CatalogItem, CatalogLookup};
use lawbook_payments::modules::commissions::{Commission, CommissionRepository, CommissionStatus};
use lawbook_payments::modules::payments::models::EarningsStatus;
use lawbook_payments::modules::payments::{Payment, PaymentRepository, PaymentStatus};
use lawbook_payments::modules::payouts::{debit_balance, Payout, PayoutRepository, PayoutStatus};
use lawbook_payments::modules::purchases::{
    Purchase, PurchaseRepository, Settlement, SettlementWrite, PURCHASE_COMPLETED,
};
use lawbook_payments::modules::sellers::{Seller, SellerRepository};

#[derive(Default)]
pub struct State {
    pub items: HashMap<String, CatalogItem>,
    pub sellers: HashMap<String, Seller>,
    pub payments: HashMap<String, Payment>,
    pub purchases: Vec<Purchase>,
    pub commissions: Vec<Commission>,
    pub payouts: HashMap<String, Payout>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }

    pub fn add_item(&self, item: CatalogItem) {
        self.with_state(|s| s.items.insert(item.id.clone(), item));
    }

    pub fn add_seller(&self, seller: Seller) {
        self.with_state(|s| s.sellers.insert(seller.id.clone(), seller));
    }

    pub fn add_payment(&self, payment: Payment) {
        self.with_state(|s| s.payments.insert(payment.id.clone(), payment));
    }

    pub fn add_purchase(&self, purchase: Purchase) {
        self.with_state(|s| s.purchases.push(purchase));
    }

    pub fn add_commission(&self, commission: Commission) {
        self.with_state(|s| s.commissions.push(commission));
    }

    pub fn seller(&self, id: &str) -> Seller {
        self.with_state(|s| s.sellers.get(id).cloned().unwrap())
    }

    pub fn payment_by_tracker(&self, tracker: &str) -> Option<Payment> {
        self.with_state(|s| s.payments.values().find(|p| p.tracker == tracker).cloned())
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.with_state(|s| s.payments.values().cloned().collect())
    }

    pub fn purchases(&self) -> Vec<Purchase> {
        self.with_state(|s| s.purchases.clone())
    }

    pub fn commissions(&self) -> Vec<Commission> {
        self.with_state(|s| s.commissions.clone())
    }

    pub fn commissions_for_seller(&self, seller_id: &str) -> Vec<Commission> {
        self.with_state(|s| {
            s.commissions
                .iter()
                .filter(|c| c.seller_id == seller_id)
                .cloned()
                .collect()
        })
    }

    pub fn payouts(&self) -> Vec<Payout> {
        self.with_state(|s| s.payouts.values().cloned().collect())
    }
}

#[async_trait]
impl CatalogLookup for InMemoryStore {
    async fn find_item(&self, item_id: &str) -> Result<Option<CatalogItem>> {
        Ok(self.with_state(|s| s.items.get(item_id).cloned()))
    }
}

#[async_trait]
impl SellerRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Seller>> {
        Ok(self.with_state(|s| s.sellers.get(id).cloned()))
    }

    async fn find_auto_payout_candidates(&self, minimum: Decimal) -> Result<Vec<Seller>> {
        Ok(self.with_state(|s| {
            let mut sellers: Vec<Seller> = s
                .sellers
                .values()
                .filter(|seller| {
                    seller.payout_settings.auto_payout && seller.available_balance >= minimum
                })
                .cloned()
                .collect();
            sellers.sort_by(|a, b| a.id.cmp(&b.id));
            sellers
        }))
    }

    async fn credit_earnings(&self, seller_id: &str, amount: Decimal) -> Result<()> {
        self.with_state(|s| {
            let seller = s
                .sellers
                .get_mut(seller_id)
                .ok_or_else(|| AppError::not_found(format!("Seller '{}' not found", seller_id)))?;
            seller.available_balance += amount;
            seller.total_earnings += amount;
            Ok(())
        })
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn create(&self, payment: &Payment) -> Result<Payment> {
        self.with_state(|s| {
            if s.payments.values().any(|p| p.tracker == payment.tracker) {
                return Err(AppError::validation("Duplicate tracker"));
            }
            s.payments.insert(payment.id.clone(), payment.clone());
            Ok(payment.clone())
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        Ok(self.with_state(|s| s.payments.get(id).cloned()))
    }

    async fn find_by_tracker(&self, tracker: &str) -> Result<Option<Payment>> {
        Ok(self.payment_by_tracker(tracker))
    }

    async fn mark_failed(
        &self,
        id: &str,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<bool> {
        Ok(self.with_state(|s| match s.payments.get_mut(id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = PaymentStatus::Failed;
                if gateway_response.is_some() {
                    payment.gateway_response = gateway_response;
                }
                payment.updated_at = Utc::now();
                true
            }
            _ => false,
        }))
    }

    async fn claim_earnings(&self, id: &str) -> Result<bool> {
        Ok(self.with_state(|s| match s.payments.get_mut(id) {
            Some(payment)
                if payment.status == PaymentStatus::Success
                    && payment.earnings_status.is_none() =>
            {
                payment.earnings_status = Some(EarningsStatus::Processing);
                true
            }
            _ => false,
        }))
    }

    async fn release_earnings(&self, id: &str) -> Result<()> {
        self.with_state(|s| {
            if let Some(payment) = s.payments.get_mut(id) {
                if payment.earnings_status == Some(EarningsStatus::Processing) {
                    payment.earnings_status = None;
                }
            }
        });
        Ok(())
    }

    async fn mark_earnings_processed(&self, id: &str) -> Result<()> {
        self.with_state(|s| {
            if let Some(payment) = s.payments.get_mut(id) {
                payment.earnings_status = Some(EarningsStatus::Processed);
            }
        });
        Ok(())
    }

    async fn find_pending_earnings(&self, limit: u32) -> Result<Vec<Payment>> {
        Ok(self.with_state(|s| {
            s.payments
                .values()
                .filter(|p| p.status == PaymentStatus::Success && p.earnings_status.is_none())
                .take(limit as usize)
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn find_completed(&self, buyer_id: &str, item_id: &str) -> Result<Option<Purchase>> {
        Ok(self.with_state(|s| {
            s.purchases
                .iter()
                .find(|p| {
                    p.buyer_id == buyer_id
                        && p.item_id == item_id
                        && p.payment_status == PURCHASE_COMPLETED
                })
                .cloned()
        }))
    }

    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<Purchase>> {
        Ok(self.with_state(|s| {
            s.purchases
                .iter()
                .find(|p| p.payment_id == payment_id)
                .cloned()
        }))
    }

    async fn record_settlement(&self, settlement: &Settlement) -> Result<SettlementWrite> {
        self.with_state(|s| {
            let payment = s.payments.get_mut(&settlement.payment_id).ok_or_else(|| {
                AppError::not_found(format!("Payment '{}' not found", settlement.payment_id))
            })?;

            if payment.status != PaymentStatus::Pending {
                return Ok(SettlementWrite::NotPending(payment.status));
            }

            payment.status = PaymentStatus::Success;
            payment.gateway_response = Some(settlement.gateway_response.clone());
            payment.updated_at = Utc::now();

            let purchase = &settlement.purchase;
            if let Some(existing) = s.purchases.iter().find(|p| {
                p.buyer_id == purchase.buyer_id
                    && p.item_id == purchase.item_id
                    && p.payment_status == purchase.payment_status
            }) {
                return Ok(SettlementWrite::AlreadyOwned {
                    purchase: existing.clone(),
                });
            }

            s.purchases.push(purchase.clone());
            s.commissions.push(settlement.commission.clone());

            Ok(SettlementWrite::Recorded {
                purchase: purchase.clone(),
                commission: settlement.commission.clone(),
            })
        })
    }
}

#[async_trait]
impl CommissionRepository for InMemoryStore {
    async fn find_by_purchase(&self, purchase_id: &str) -> Result<Option<Commission>> {
        Ok(self.with_state(|s| {
            s.commissions
                .iter()
                .find(|c| c.purchase_id == purchase_id)
                .cloned()
        }))
    }

    async fn find_by_payout(&self, payout_id: &str) -> Result<Vec<Commission>> {
        Ok(self.with_state(|s| {
            s.commissions
                .iter()
                .filter(|c| c.payout_id.as_deref() == Some(payout_id))
                .cloned()
                .collect()
        }))
    }
}

fn processing_payout<'a>(s: &'a mut State, payout_id: &str) -> Result<&'a mut Payout> {
    let payout = s
        .payouts
        .get_mut(payout_id)
        .ok_or_else(|| AppError::not_found(format!("Payout '{}' not found", payout_id)))?;
    if payout.status != PayoutStatus::Processing {
        return Err(AppError::validation(format!(
            "Payout '{}' is already {}",
            payout_id, payout.status
        )));
    }
    Ok(payout)
}

#[async_trait]
impl PayoutRepository for InMemoryStore {
    async fn open_batch(
        &self,
        payout: &Payout,
        batch_cap: u32,
    ) -> Result<Option<(Payout, Vec<Commission>)>> {
        Ok(self.with_state(|s| {
            let mut payable: Vec<&mut Commission> = s
                .commissions
                .iter_mut()
                .filter(|c| c.seller_id == payout.seller_id && c.is_payable())
                .collect();
            payable.sort_by_key(|c| c.created_at);
            payable.truncate(batch_cap as usize);

            if payable.is_empty() {
                return None;
            }

            let mut reserved = Vec::with_capacity(payable.len());
            for commission in payable {
                commission.payout_id = Some(payout.id.clone());
                reserved.push(commission.clone());
            }

            let mut opened = payout.clone();
            opened.amount = reserved.iter().map(|c| c.seller_amount).sum();
            opened.commission_ids = reserved.iter().map(|c| c.id.clone()).collect();
            s.payouts.insert(opened.id.clone(), opened.clone());

            Some((opened, reserved))
        }))
    }

    async fn complete(&self, payout_id: &str, external_reference: &str) -> Result<Payout> {
        self.with_state(|s| {
            let now = Utc::now();
            let payout = processing_payout(s, payout_id)?;
            payout.status = PayoutStatus::Completed;
            payout.external_reference = Some(external_reference.to_string());
            payout.completed_at = Some(now);
            payout.updated_at = now;
            let payout = payout.clone();

            for commission in s.commissions.iter_mut().filter(|c| {
                c.payout_id.as_deref() == Some(payout_id)
                    && c.status == CommissionStatus::Processed
            }) {
                commission.status = CommissionStatus::PaidOut;
                commission.paid_out_at = Some(now);
            }

            if let Some(seller) = s.sellers.get_mut(&payout.seller_id) {
                seller.available_balance =
                    debit_balance(seller.available_balance, payout.amount).remaining;
                seller.total_withdrawn += payout.amount;
                seller.last_payout_date = Some(now);
            }

            Ok(payout)
        })
    }

    async fn fail(&self, payout_id: &str, reason: &str) -> Result<Payout> {
        self.with_state(|s| {
            let payout = processing_payout(s, payout_id)?;
            payout.status = PayoutStatus::Failed;
            payout.failure_reason = Some(reason.to_string());
            payout.updated_at = Utc::now();
            let payout = payout.clone();

            for commission in s.commissions.iter_mut().filter(|c| {
                c.payout_id.as_deref() == Some(payout_id)
                    && c.status == CommissionStatus::Processed
            }) {
                commission.payout_id = None;
            }

            Ok(payout)
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payout>> {
        Ok(self.with_state(|s| s.payouts.get(id).cloned()))
    }

    async fn list_for_seller(&self, seller_id: &str, limit: u32) -> Result<Vec<Payout>> {
        Ok(self.with_state(|s| {
            let mut payouts: Vec<Payout> = s
                .payouts
                .values()
                .filter(|p| p.seller_id == seller_id)
                .cloned()
                .collect();
            payouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            payouts.truncate(limit as usize);
            payouts
        }))
    }
}
