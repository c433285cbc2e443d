// Test Data Factory
//
// Builds sellers, catalog items, payments and commissions with unique ids.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use lawbook_payments::core::Currency;
use lawbook_payments::modules::catalog::CatalogItem;
use lawbook_payments::modules::commissions::{Commission, CommissionSchedule};
use lawbook_payments::modules::payments::{NewPayment, Payment};
use lawbook_payments::modules::sellers::{
    BankAccount, PayoutMethod, PayoutSettings, Seller, SellerType,
};

pub struct TestDataFactory;

impl TestDataFactory {
    pub fn random_id(prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4().simple())
    }

    /// Seller with nothing verified and auto payout off
    pub fn seller(id: &str, seller_type: SellerType) -> Seller {
        Seller {
            id: id.to_string(),
            name: format!("Seller {}", id),
            email: format!("{}@example.com", id),
            seller_type,
            available_balance: Decimal::ZERO,
            total_earnings: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            last_payout_date: None,
            payout_settings: PayoutSettings {
                auto_payout: false,
                payout_method: PayoutMethod::BankTransfer,
            },
            jazzcash_number: None,
            jazzcash_verified: false,
            easypaisa_number: None,
            easypaisa_verified: false,
            bank_account: None,
            bank_verified: false,
            safepay_recipient_id: None,
            safepay_verified: false,
        }
    }

    /// Seller enrolled in auto payout with a verified account on `method`
    pub fn payout_ready_seller(id: &str, balance: Decimal, method: PayoutMethod) -> Seller {
        let mut seller = Self::seller(id, SellerType::Individual);
        seller.available_balance = balance;
        seller.total_earnings = balance;
        seller.payout_settings = PayoutSettings {
            auto_payout: true,
            payout_method: method,
        };
        match method {
            PayoutMethod::JazzCash => {
                seller.jazzcash_number = Some("03001234567".to_string());
                seller.jazzcash_verified = true;
            }
            PayoutMethod::EasyPaisa => {
                seller.easypaisa_number = Some("03111234567".to_string());
                seller.easypaisa_verified = true;
            }
            PayoutMethod::BankTransfer => {
                seller.bank_account = Some(BankAccount {
                    account_title: "Test Seller".to_string(),
                    account_number: "0001234567890".to_string(),
                    bank_name: "Test Bank".to_string(),
                    iban: Some("PK36SCBL0000001123456702".to_string()),
                });
                seller.bank_verified = true;
            }
            PayoutMethod::Safepay => {
                seller.safepay_recipient_id = Some("rcp_test".to_string());
                seller.safepay_verified = true;
            }
        }
        seller
    }

    pub fn approved_item(id: &str, seller: &Seller, price: Decimal) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: format!("Constitutional Law Digest {}", id),
            status: "approved".to_string(),
            price,
            discounted_price: None,
            seller_id: seller.id.clone(),
            seller_type: seller.seller_type,
        }
    }

    /// Pending payment as checkout would have recorded it
    pub fn pending_payment(
        tracker: &str,
        buyer_id: &str,
        item: &CatalogItem,
        schedule: &CommissionSchedule,
    ) -> Payment {
        let amount = item.effective_price();
        Payment::new(NewPayment {
            tracker: tracker.to_string(),
            transaction_ref: Self::random_id("LB"),
            buyer_id: buyer_id.to_string(),
            item_id: item.id.clone(),
            seller_id: item.seller_id.clone(),
            amount,
            currency: Currency::PKR,
            seller_type: item.seller_type,
            commission: schedule.split(amount, item.seller_type, Currency::PKR),
            gateway_response: None,
        })
        .unwrap()
    }

    /// Unreserved commission owed to `seller_id`, `age_minutes` old
    pub fn processed_commission(seller_id: &str, seller_amount: Decimal, age_minutes: i64) -> Commission {
        let schedule = CommissionSchedule::default();
        let total = seller_amount * Decimal::from(100) / Decimal::from(80);
        let mut commission = Commission::new(
            Self::random_id("pay"),
            Self::random_id("pur"),
            Self::random_id("buyer"),
            seller_id.to_string(),
            SellerType::Individual,
            total,
            schedule.split(total, SellerType::Individual, Currency::PKR),
        );
        commission.seller_amount = seller_amount;
        commission.platform_amount = total - seller_amount;
        commission.created_at = Utc::now() - Duration::minutes(age_minutes);
        commission
    }
}
