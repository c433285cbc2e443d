pub mod payout;

pub use payout::{
    debit_balance, generate_payout_reference, BalanceDebit, Payout, PayoutRow, PayoutStatus,
};
