pub mod models;
pub mod repositories;

pub use models::{
    BankAccount, PayoutMethod, PayoutSettings, RecipientDetails, Seller, SellerType,
};
pub use repositories::{MySqlSellerRepository, SellerRepository};
