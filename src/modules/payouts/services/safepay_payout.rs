use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::rails::{PayoutContext, PayoutRail, TransferOutcome};
use crate::core::{AppError, Result};
use crate::modules::sellers::{PayoutMethod, RecipientDetails};

/// Safepay disbursement rail
///
/// Transfers are not retried here: the payout reference doubles as the
/// idempotency key, and a failed attempt leaves the commissions free for
/// the next sweep.
pub struct SafepayPayoutRail {
    http: Client,
    base_url: String,
    secret_key: String,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    recipient: &'a str,
    amount: Decimal,
    currency: String,
    reference: &'a str,
}

impl SafepayPayoutRail {
    pub fn new(base_url: &str, secret_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/payouts/v1/transfer", self.base_url)
    }
}

#[async_trait]
impl PayoutRail for SafepayPayoutRail {
    fn method(&self) -> PayoutMethod {
        PayoutMethod::Safepay
    }

    async fn attempt_transfer(
        &self,
        recipient: &RecipientDetails,
        amount: Decimal,
        context: &PayoutContext,
    ) -> Result<TransferOutcome> {
        let RecipientDetails::Gateway { recipient_id } = recipient else {
            return Ok(TransferOutcome::Failed {
                reason: "Recipient details are not a Safepay recipient".to_string(),
            });
        };

        let body = TransferRequest {
            recipient: recipient_id,
            amount,
            currency: context.currency.to_string(),
            reference: &context.reference,
        };

        let resp = self
            .http
            .post(self.url())
            .header("X-SFPY-MERCHANT-SECRET", &self.secret_key)
            .header("Idempotency-Key", &context.reference)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if status.is_server_error() {
            return Err(AppError::gateway(format!(
                "Safepay payout HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let reason = parsed["status"]["message"]
                .as_str()
                .or_else(|| parsed["message"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Safepay payout rejected (HTTP {})", status.as_u16()));
            return Ok(TransferOutcome::Failed { reason });
        }

        let external_ref = parsed["data"]["token"]
            .as_str()
            .or_else(|| parsed["data"]["id"].as_str())
            .ok_or_else(|| AppError::gateway("Safepay payout response missing transfer id"))?;

        Ok(TransferOutcome::Completed {
            external_ref: external_ref.to_string(),
        })
    }
}
