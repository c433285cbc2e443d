pub mod purchase_repository;

pub use purchase_repository::{
    MySqlPurchaseRepository, PurchaseRepository, Settlement, SettlementWrite,
};
