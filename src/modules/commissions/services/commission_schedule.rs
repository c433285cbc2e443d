use rust_decimal::Decimal;

use crate::core::Currency;
use crate::modules::commissions::models::CommissionSplit;
use crate::modules::sellers::SellerType;

/// Platform commission percentage per seller type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionSchedule {
    admin_rate: Decimal,
    publisher_rate: Decimal,
    individual_rate: Decimal,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self::new(Decimal::new(100, 0), Decimal::new(15, 0), Decimal::new(20, 0))
    }
}

impl CommissionSchedule {
    pub fn new(admin_rate: Decimal, publisher_rate: Decimal, individual_rate: Decimal) -> Self {
        Self {
            admin_rate,
            publisher_rate,
            individual_rate,
        }
    }

    pub fn rate_for(&self, seller_type: SellerType) -> Decimal {
        match seller_type {
            SellerType::Admin => self.admin_rate,
            SellerType::Publisher => self.publisher_rate,
            SellerType::Individual => self.individual_rate,
        }
    }

    /// Split `total` for a seller type.
    ///
    /// The platform share is rounded to the currency scale and the seller
    /// gets the exact remainder, so the two parts always add up to `total`.
    pub fn split(&self, total: Decimal, seller_type: SellerType, currency: Currency) -> CommissionSplit {
        let commission_percentage = self.rate_for(seller_type);
        let platform_amount = currency.round(total * commission_percentage / Decimal::ONE_HUNDRED);

        CommissionSplit {
            seller_amount: total - platform_amount,
            platform_amount,
            commission_percentage,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, rate) in [
            ("admin", self.admin_rate),
            ("publisher", self.publisher_rate),
            ("individual", self.individual_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(format!(
                    "Commission rate for {} sellers must be between 0 and 100, got {}",
                    name, rate
                ));
            }
        }
        Ok(())
    }
}
