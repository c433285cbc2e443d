pub mod purchase;

pub use purchase::{Purchase, PurchaseRow, PURCHASE_COMPLETED};
