use async_trait::async_trait;
use std::sync::Arc;

use crate::core::Result;
use crate::modules::payments::models::Payment;
use crate::modules::purchases::Purchase;
use crate::modules::sellers::SellerRepository;

/// Downstream bookkeeping run once a payment settles.
///
/// Invoked after the settlement transaction commits; an error here never
/// undoes the purchase.
#[async_trait]
pub trait EarningsDistributor: Send + Sync {
    async fn distribute(&self, payment: &Payment, purchase: &Purchase) -> Result<()>;
}

/// Credits the seller's share of a sale to their wallet
pub struct SellerEarningsDistributor {
    seller_repo: Arc<dyn SellerRepository>,
}

impl SellerEarningsDistributor {
    pub fn new(seller_repo: Arc<dyn SellerRepository>) -> Self {
        Self { seller_repo }
    }
}

#[async_trait]
impl EarningsDistributor for SellerEarningsDistributor {
    async fn distribute(&self, payment: &Payment, purchase: &Purchase) -> Result<()> {
        self.seller_repo
            .credit_earnings(&payment.seller_id, payment.commission.seller_amount)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            purchase_id = %purchase.id,
            seller_id = %payment.seller_id,
            seller_amount = %payment.commission.seller_amount,
            "Seller earnings credited"
        );

        Ok(())
    }
}
