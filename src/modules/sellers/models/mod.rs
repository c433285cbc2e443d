pub mod seller;

pub use seller::{
    BankAccount, PayoutMethod, PayoutSettings, RecipientDetails, Seller, SellerRow, SellerType,
};
