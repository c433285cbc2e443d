use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};
use crate::modules::sellers::SellerType;

/// Purchasable catalog entry (book or judgment) as seen by checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub status: String,
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub seller_id: String,
    pub seller_type: SellerType,
}

impl CatalogItem {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }

    /// Price the buyer pays: the discount when it is set, positive and lower
    pub fn effective_price(&self) -> Decimal {
        match self.discounted_price {
            Some(discounted) if discounted > Decimal::ZERO && discounted < self.price => {
                discounted
            }
            _ => self.price,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CatalogItemRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub seller_id: String,
    pub seller_type: String,
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = AppError;

    fn try_from(row: CatalogItemRow) -> Result<Self> {
        Ok(CatalogItem {
            seller_type: row.seller_type.parse().map_err(AppError::Internal)?,
            id: row.id,
            title: row.title,
            status: row.status,
            price: row.price,
            discounted_price: row.discounted_price,
            seller_id: row.seller_id,
        })
    }
}
