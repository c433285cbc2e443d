pub mod notifier;
pub mod payout_service;
pub mod rails;
pub mod safepay_payout;
pub mod settlement_scheduler;

pub use notifier::{LogNotifier, PayoutNotifier};
pub use payout_service::{PayoutResult, PayoutRunStatus, PayoutService};
pub use rails::{PayoutContext, PayoutRail, RailRegistry, TransferOutcome};
pub use safepay_payout::SafepayPayoutRail;
pub use settlement_scheduler::SettlementScheduler;
