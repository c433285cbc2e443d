use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use super::payout_service::PayoutService;
use crate::modules::payments::ReconciliationService;

/// Settled payments whose earnings are retried per tick
const EARNINGS_RETRY_LIMIT: u32 = 100;

/// Background job: retries missed earnings, then sweeps seller balances.
///
/// Spawned as a tokio task in main.rs.
pub struct SettlementScheduler {
    payouts: Arc<PayoutService>,
    reconciliation: Arc<ReconciliationService>,
    period: Duration,
}

impl SettlementScheduler {
    pub fn new(
        payouts: Arc<PayoutService>,
        reconciliation: Arc<ReconciliationService>,
        period: Duration,
    ) -> Self {
        Self {
            payouts,
            reconciliation,
            period,
        }
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            period_secs = self.period.as_secs(),
            "Starting payout settlement scheduler"
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; let startup finish first
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// One full pass. Errors are logged; the next tick tries again.
    pub async fn run_once(&self) {
        match self
            .reconciliation
            .retry_pending_earnings(EARNINGS_RETRY_LIMIT)
            .await
        {
            Ok(0) => {}
            Ok(count) => info!(count = count, "Pending earnings distributed"),
            Err(e) => error!(error = %e, "Earnings retry failed"),
        }

        match self.payouts.process_all_auto_payouts().await {
            Ok(results) => {
                let failed = results.iter().filter(|r| !r.success).count();
                info!(
                    sellers = results.len(),
                    unsuccessful = failed,
                    "Scheduled payout sweep done"
                );
            }
            Err(e) => error!(error = %e, "Scheduled payout sweep failed"),
        }
    }
}
