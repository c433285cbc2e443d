pub mod catalog;
pub mod commissions;
pub mod gateways;
pub mod health;
pub mod payments;
pub mod payouts;
pub mod purchases;
pub mod sellers;
