pub mod models;
pub mod repositories;

pub use models::CatalogItem;
pub use repositories::{CatalogLookup, MySqlCatalogLookup};
