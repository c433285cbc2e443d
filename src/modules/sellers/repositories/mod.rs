pub mod seller_repository;

pub use seller_repository::{MySqlSellerRepository, SellerRepository};
