use async_trait::async_trait;

use crate::core::Result;
use crate::modules::payouts::models::Payout;
use crate::modules::sellers::Seller;

/// Seller-facing payout confirmations. Best-effort.
#[async_trait]
pub trait PayoutNotifier: Send + Sync {
    async fn payout_completed(&self, seller: &Seller, payout: &Payout) -> Result<()>;
}

/// Records notifications in the log stream instead of sending them
pub struct LogNotifier;

#[async_trait]
impl PayoutNotifier for LogNotifier {
    async fn payout_completed(&self, seller: &Seller, payout: &Payout) -> Result<()> {
        tracing::info!(
            seller_id = %seller.id,
            email = %seller.email,
            payout_id = %payout.id,
            reference = %payout.reference,
            amount = %payout.amount,
            currency = %payout.currency,
            "Payout confirmation queued for seller"
        );
        Ok(())
    }
}
