pub mod models;
pub mod repositories;

pub use models::{Purchase, PURCHASE_COMPLETED};
pub use repositories::{MySqlPurchaseRepository, PurchaseRepository, Settlement, SettlementWrite};
