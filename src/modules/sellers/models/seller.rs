use crate::core::{AppError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Which commission schedule applies to a seller's sales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerType {
    /// Platform-owned listings
    Admin,
    /// Publishing houses
    Publisher,
    /// Individual authors and lawyers
    Individual,
}

impl SellerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SellerType::Admin => "admin",
            SellerType::Publisher => "publisher",
            SellerType::Individual => "individual",
        }
    }
}

impl std::fmt::Display for SellerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SellerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(SellerType::Admin),
            "publisher" => Ok(SellerType::Publisher),
            "individual" => Ok(SellerType::Individual),
            _ => Err(format!("Invalid seller type: {}", s)),
        }
    }
}

/// Settlement rail a seller receives payouts through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    #[serde(rename = "jazzcash", alias = "jazz_cash")]
    JazzCash,
    #[serde(rename = "easypaisa", alias = "easy_paisa")]
    EasyPaisa,
    BankTransfer,
    Safepay,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMethod::JazzCash => "jazzcash",
            PayoutMethod::EasyPaisa => "easypaisa",
            PayoutMethod::BankTransfer => "bank_transfer",
            PayoutMethod::Safepay => "safepay",
        }
    }
}

impl std::fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PayoutMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "jazzcash" | "jazz_cash" => Ok(PayoutMethod::JazzCash),
            "easypaisa" | "easy_paisa" => Ok(PayoutMethod::EasyPaisa),
            "bank_transfer" => Ok(PayoutMethod::BankTransfer),
            "safepay" => Ok(PayoutMethod::Safepay),
            _ => Err(format!("Invalid payout method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSettings {
    pub auto_payout: bool,
    pub payout_method: PayoutMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_title: String,
    pub account_number: String,
    pub bank_name: String,
    pub iban: Option<String>,
}

/// Where a payout lands, snapshotted onto the Payout when it is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipientDetails {
    MobileWallet {
        provider: PayoutMethod,
        wallet_number: String,
    },
    Bank(BankAccount),
    Gateway {
        recipient_id: String,
    },
}

/// Seller wallet state and payout preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    pub name: String,
    pub email: String,
    pub seller_type: SellerType,
    pub available_balance: Decimal,
    pub total_earnings: Decimal,
    pub total_withdrawn: Decimal,
    pub last_payout_date: Option<DateTime<Utc>>,
    pub payout_settings: PayoutSettings,
    pub jazzcash_number: Option<String>,
    pub jazzcash_verified: bool,
    pub easypaisa_number: Option<String>,
    pub easypaisa_verified: bool,
    pub bank_account: Option<BankAccount>,
    pub bank_verified: bool,
    pub safepay_recipient_id: Option<String>,
    pub safepay_verified: bool,
}

impl Seller {
    /// Recipient details for the configured rail, if that rail is verified
    pub fn verified_recipient(&self) -> Option<RecipientDetails> {
        match self.payout_settings.payout_method {
            PayoutMethod::JazzCash if self.jazzcash_verified => {
                self.jazzcash_number
                    .clone()
                    .map(|wallet_number| RecipientDetails::MobileWallet {
                        provider: PayoutMethod::JazzCash,
                        wallet_number,
                    })
            }
            PayoutMethod::EasyPaisa if self.easypaisa_verified => {
                self.easypaisa_number
                    .clone()
                    .map(|wallet_number| RecipientDetails::MobileWallet {
                        provider: PayoutMethod::EasyPaisa,
                        wallet_number,
                    })
            }
            PayoutMethod::BankTransfer if self.bank_verified => {
                self.bank_account.clone().map(RecipientDetails::Bank)
            }
            PayoutMethod::Safepay if self.safepay_verified => self
                .safepay_recipient_id
                .clone()
                .map(|recipient_id| RecipientDetails::Gateway { recipient_id }),
            _ => None,
        }
    }
}

/// Flat `sellers` row
#[derive(Debug, Clone, FromRow)]
pub struct SellerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub seller_type: String,
    pub available_balance: Decimal,
    pub total_earnings: Decimal,
    pub total_withdrawn: Decimal,
    pub last_payout_date: Option<DateTime<Utc>>,
    pub auto_payout: bool,
    pub payout_method: String,
    pub jazzcash_number: Option<String>,
    pub jazzcash_verified: bool,
    pub easypaisa_number: Option<String>,
    pub easypaisa_verified: bool,
    pub bank_account_title: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_iban: Option<String>,
    pub bank_verified: bool,
    pub safepay_recipient_id: Option<String>,
    pub safepay_verified: bool,
}

impl TryFrom<SellerRow> for Seller {
    type Error = AppError;

    fn try_from(row: SellerRow) -> Result<Self> {
        let bank_account = match (row.bank_account_title, row.bank_account_number, row.bank_name)
        {
            (Some(account_title), Some(account_number), Some(bank_name)) => Some(BankAccount {
                account_title,
                account_number,
                bank_name,
                iban: row.bank_iban,
            }),
            _ => None,
        };

        Ok(Seller {
            seller_type: row.seller_type.parse().map_err(AppError::Internal)?,
            payout_settings: PayoutSettings {
                auto_payout: row.auto_payout,
                payout_method: row.payout_method.parse().map_err(AppError::Internal)?,
            },
            id: row.id,
            name: row.name,
            email: row.email,
            available_balance: row.available_balance,
            total_earnings: row.total_earnings,
            total_withdrawn: row.total_withdrawn,
            last_payout_date: row.last_payout_date,
            jazzcash_number: row.jazzcash_number,
            jazzcash_verified: row.jazzcash_verified,
            easypaisa_number: row.easypaisa_number,
            easypaisa_verified: row.easypaisa_verified,
            bank_account,
            bank_verified: row.bank_verified,
            safepay_recipient_id: row.safepay_recipient_id,
            safepay_verified: row.safepay_verified,
        })
    }
}
