pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{debit_balance, BalanceDebit, Payout, PayoutStatus};
pub use repositories::{MySqlPayoutRepository, PayoutRepository};
pub use services::{
    LogNotifier, PayoutContext, PayoutNotifier, PayoutRail, PayoutResult, PayoutRunStatus,
    PayoutService, RailRegistry, SafepayPayoutRail, SettlementScheduler, TransferOutcome,
};
