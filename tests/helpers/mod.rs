#![allow(dead_code)]
// Test Helper Modules
//
// In-memory repositories, scripted gateway and rails, data factories, a
// throwaway MySQL database, and a harness that wires them into the real
// services.
//
// Usage (from a test crate):
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//   use helpers::*;

pub mod in_memory;
pub mod test_data;

pub use fakes::*;
pub use in_memory::*;
pub use test_data::*;
pub use test_database::*;

use actix_web::web;
use std::sync::Arc;

use lawbook_payments::config::PayoutConfig;
use lawbook_payments::core::Currency;
use lawbook_payments::modules::commissions::CommissionSchedule;
use lawbook_payments::modules::payments::{
    CheckoutService, EarningsDistributor, ReconciliationService, ReturnPageSettings,
    SellerEarningsDistributor,
};
use lawbook_payments::modules::payouts::{LogNotifier, PayoutRail, PayoutService, RailRegistry};

pub const FRONTEND_URL: &str = "http://shop.test";

/// Real services over in-memory storage and a scripted gateway
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub schedule: CommissionSchedule,
    pub checkout: Arc<CheckoutService>,
    pub reconciliation: Arc<ReconciliationService>,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let earnings = Arc::new(SellerEarningsDistributor::new(store.clone()));
        Self::with_earnings(store, earnings)
    }

    pub fn with_earnings(
        store: Arc<InMemoryStore>,
        earnings: Arc<dyn EarningsDistributor>,
    ) -> Self {
        let gateway = Arc::new(FakeGateway::new());
        let schedule = CommissionSchedule::default();

        let checkout = Arc::new(CheckoutService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            gateway.clone(),
            schedule.clone(),
            Currency::PKR,
        ));

        let reconciliation = Arc::new(ReconciliationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            gateway.clone(),
            earnings,
        ));

        Self {
            store,
            gateway,
            schedule,
            checkout,
            reconciliation,
        }
    }

    pub fn return_page_settings() -> ReturnPageSettings {
        ReturnPageSettings {
            frontend_url: FRONTEND_URL.to_string(),
        }
    }

    /// App data for mounting the payment routes in an actix test app
    pub fn payment_app_data(
        &self,
    ) -> (
        web::Data<Arc<CheckoutService>>,
        web::Data<Arc<ReconciliationService>>,
        web::Data<ReturnPageSettings>,
    ) {
        (
            web::Data::new(self.checkout.clone()),
            web::Data::new(self.reconciliation.clone()),
            web::Data::new(Self::return_page_settings()),
        )
    }
}

pub fn payout_config() -> PayoutConfig {
    PayoutConfig::default()
}

/// Payout service over `store` with the given rails
pub fn payout_service(
    store: &Arc<InMemoryStore>,
    rails: Vec<Arc<dyn PayoutRail>>,
    config: PayoutConfig,
) -> Arc<PayoutService> {
    let mut registry = RailRegistry::new();
    for rail in rails {
        registry.register(rail);
    }

    Arc::new(PayoutService::new(
        store.clone(),
        store.clone(),
        registry,
        Arc::new(LogNotifier),
        config,
        Currency::PKR,
    ))
}
