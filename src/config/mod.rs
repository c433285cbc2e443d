use crate::core::{AppError, Currency, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

use crate::modules::commissions::CommissionSchedule;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub safepay: SafepayConfig,
    pub payouts: PayoutConfig,
    pub commission: CommissionSchedule,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: String,
    /// Storefront origin, used for CORS and for links on the return page
    pub frontend_url: String,
    /// Public origin of this API, used to build gateway redirect URLs
    pub public_api_url: String,
    /// Settlement currency for checkout and payouts
    pub currency: Currency,
}

#[derive(Debug, Clone)]
pub struct SafepayConfig {
    pub api_key: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub environment: String,
    pub api_url: String,
    pub checkout_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct PayoutConfig {
    pub minimum_amount: Decimal,
    pub batch_cap: u32,
    pub sweep_interval: Duration,
    pub sweep_enabled: bool,
    /// Base URL of the gateway payout API; the Safepay rail is disabled without it
    pub safepay_payout_url: Option<String>,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            minimum_amount: Decimal::new(1000, 0),
            batch_cap: 50,
            sweep_interval: Duration::from_secs(3600),
            sweep_enabled: true,
            safepay_payout_url: None,
        }
    }
}

pub(crate) fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{} not set", name)))
}

pub(crate) fn parsed<T: FromStr>(name: &str, default: &str) -> Result<T> {
    var_or(name, default)
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", name)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: var_or("APP_ENV", "development"),
                log_level: var_or("LOG_LEVEL", "info"),
                log_format: var_or("LOG_FORMAT", "pretty"),
                frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),
                public_api_url: var_or("PUBLIC_API_URL", "http://localhost:8080"),
                currency: parsed("APP_CURRENCY", "PKR")?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            safepay: SafepayConfig {
                api_key: required("SAFEPAY_API_KEY")?,
                secret_key: required("SAFEPAY_SECRET_KEY")?,
                webhook_secret: required("SAFEPAY_WEBHOOK_SECRET")?,
                environment: var_or("SAFEPAY_ENVIRONMENT", "sandbox"),
                api_url: var_or("SAFEPAY_API_URL", "https://sandbox.api.getsafepay.com"),
                checkout_url: var_or("SAFEPAY_CHECKOUT_URL", "https://sandbox.api.getsafepay.com/checkout/pay"),
                timeout: Duration::from_secs(parsed("SAFEPAY_TIMEOUT_SECS", "15")?),
                max_retries: parsed("SAFEPAY_MAX_RETRIES", "2")?,
            },
            payouts: PayoutConfig {
                minimum_amount: parsed("PAYOUT_MINIMUM_AMOUNT", "1000")?,
                batch_cap: parsed("PAYOUT_BATCH_CAP", "50")?,
                sweep_interval: Duration::from_secs(parsed("PAYOUT_SWEEP_INTERVAL_SECS", "3600")?),
                sweep_enabled: parsed("PAYOUT_SWEEP_ENABLED", "true")?,
                safepay_payout_url: env::var("SAFEPAY_PAYOUT_URL").ok(),
            },
            commission: CommissionSchedule::new(
                parsed("COMMISSION_RATE_ADMIN", "100")?,
                parsed("COMMISSION_RATE_PUBLISHER", "15")?,
                parsed("COMMISSION_RATE_INDIVIDUAL", "20")?,
            ),
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.payouts.minimum_amount <= Decimal::ZERO {
            return Err(AppError::Configuration(
                "Minimum payout amount must be greater than 0".to_string(),
            ));
        }

        if self.payouts.batch_cap == 0 {
            return Err(AppError::Configuration(
                "Payout batch cap must be at least 1".to_string(),
            ));
        }

        if self.payouts.sweep_interval < Duration::from_secs(60) {
            return Err(AppError::Configuration(
                "Payout sweep interval must be at least 60 seconds".to_string(),
            ));
        }

        if self.safepay.timeout.is_zero() {
            return Err(AppError::Configuration(
                "Gateway timeout must be at least 1 second".to_string(),
            ));
        }

        self.commission.validate().map_err(AppError::Configuration)?;

        Ok(())
    }
}
