//! Payment intake and commission settlement for the law-book storefront.
//!
//! Checkout through Safepay, reconciliation of the browser return path and
//! the gateway webhook into one idempotent state machine, and periodic
//! payout of seller commissions over pluggable rails.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

pub use modules::gateways;
pub use modules::payments;
pub use modules::payouts;
