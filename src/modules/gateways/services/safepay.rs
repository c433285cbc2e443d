use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sha2::Sha512;
use std::str::FromStr;

use super::gateway_trait::{
    CheckoutRequest, CheckoutSession, PaymentGateway, SettlementState, SettlementStatus,
    WebhookEvent, WebhookEventStatus,
};
use crate::config::SafepayConfig;
use crate::core::{AppError, Result};
use crate::modules::payments::models::generate_transaction_ref;

type HmacSha512 = Hmac<Sha512>;

/// Header Safepay signs webhook deliveries with
pub const SIGNATURE_HEADER: &str = "X-SFPY-SIGNATURE";

const MERCHANT_SECRET_HEADER: &str = "X-SFPY-MERCHANT-SECRET";

const PAID_STATES: &[&str] = &["PAID", "TRACKER_ENDED", "COMPLETED", "SUCCEEDED"];
const FAILED_STATES: &[&str] = &["FAILED", "CANCELLED", "TRACKER_CANCELLED", "EXPIRED"];
const PAID_EVENTS: &[&str] = &[
    "payment.completed",
    "payment.succeeded",
    "payment.paid",
    "payment:created",
];
const FAILED_EVENTS: &[&str] = &["payment.failed", "payment.cancelled", "payment.expired"];

/// Safepay hosted-checkout client
///
/// API Documentation: https://safepay-docs.netlify.app
pub struct SafepayClient {
    /// Used for session creation, which must not be silently retried
    client: Client,
    /// Used for idempotent reads
    read_client: ClientWithMiddleware,
    api_key: String,
    secret_key: String,
    webhook_secret: String,
    environment: String,
    api_url: String,
    checkout_url: String,
    return_url: String,
}

impl SafepayClient {
    /// Create a new Safepay client
    ///
    /// # Arguments
    /// * `config` - Credentials, endpoints and timeouts
    /// * `return_url` - Absolute URL of the return-path endpoint
    pub fn new(config: &SafepayConfig, return_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let read_client = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            read_client,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            environment: config.environment.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            checkout_url: config.checkout_url.clone(),
            return_url,
        })
    }

    fn hosted_checkout_url(&self, tracker: &str, transaction_ref: &str) -> Result<String> {
        let mut cancel_url = Url::parse(&self.return_url)
            .map_err(|e| AppError::Configuration(format!("Invalid return URL: {}", e)))?;
        cancel_url.query_pairs_mut().append_pair("cancel", "true");

        let mut url = Url::parse(&self.checkout_url)
            .map_err(|e| AppError::Configuration(format!("Invalid checkout URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("env", &self.environment)
            .append_pair("beacon", tracker)
            .append_pair("source", "custom")
            .append_pair("order_id", transaction_ref)
            .append_pair("redirect_url", &self.return_url)
            .append_pair("cancel_url", cancel_url.as_str());

        Ok(url.to_string())
    }
}

#[derive(Serialize)]
struct InitRequest<'a> {
    client: &'a str,
    amount: Decimal,
    currency: String,
    environment: &'a str,
    metadata: &'a Value,
}

#[async_trait]
impl PaymentGateway for SafepayClient {
    async fn initiate_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let url = format!("{}/order/v1/init", self.api_url);
        let transaction_ref = generate_transaction_ref();

        let mut metadata = request.metadata.clone();
        if let Value::Object(map) = &mut metadata {
            map.insert("buyer_id".to_string(), Value::from(request.buyer_id.clone()));
            map.insert("item_id".to_string(), Value::from(request.item_id.clone()));
            map.insert("seller_id".to_string(), Value::from(request.seller_id.clone()));
            map.insert("order_id".to_string(), Value::from(transaction_ref.clone()));
        }

        let body = InitRequest {
            client: &self.api_key,
            amount: request.amount,
            currency: request.currency.to_string(),
            environment: &self.environment,
            metadata: &metadata,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::gateway(format!("Safepay checkout timed out: {}", e))
                } else {
                    AppError::gateway(format!("Safepay checkout request failed: {}", e))
                }
            })?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| AppError::gateway(format!("Failed to read Safepay response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::gateway(format!(
                "Safepay API error - HTTP {} ({})",
                status.as_u16(),
                response_body
            )));
        }

        let parsed: Value = serde_json::from_str(&response_body)
            .map_err(|e| AppError::gateway(format!("Malformed Safepay response: {}", e)))?;

        let tracker = parsed["data"]["token"]
            .as_str()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::gateway("Safepay response missing tracker token"))?
            .to_string();

        let redirect_url = self.hosted_checkout_url(&tracker, &transaction_ref)?;

        tracing::info!(
            tracker = %tracker,
            transaction_ref = %transaction_ref,
            item_id = %request.item_id,
            "Safepay checkout session created"
        );

        Ok(CheckoutSession {
            redirect_url,
            tracker,
            transaction_ref,
        })
    }

    async fn verify_settlement(&self, tracker: &str) -> Result<SettlementState> {
        let url = format!("{}/order/v1/{}", self.api_url, tracker);

        let response = self
            .read_client
            .get(&url)
            .header(MERCHANT_SECRET_HEADER, &self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::gateway(format!(
                "Safepay verification error - HTTP {} ({})",
                status.as_u16(),
                body
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| AppError::gateway(format!("Malformed Safepay verification: {}", e)))?;

        settlement_from_response(tracker, raw)
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], signature: Option<&str>) -> bool {
        match signature {
            Some(signature) => verify_signature(&self.webhook_secret, raw_body, signature),
            None => false,
        }
    }

    fn parse_webhook_event(&self, payload: &Value) -> Result<WebhookEvent> {
        parse_event(payload)
    }

    fn name(&self) -> &str {
        "safepay"
    }
}

/// Hex HMAC-SHA512 of `body` under `secret`
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature over the raw body
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn decimal_field(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

fn str_field<'a>(candidates: &[&'a Value]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Only a listed terminal state is a verdict. Anything else is still in flight.
fn classify_state(state: &str) -> SettlementStatus {
    if PAID_STATES.contains(&state) {
        SettlementStatus::Paid
    } else if FAILED_STATES.contains(&state) {
        SettlementStatus::Failed
    } else {
        SettlementStatus::Pending
    }
}

fn settlement_from_response(tracker: &str, raw: Value) -> Result<SettlementState> {
    let data = &raw["data"];
    if data.is_null() {
        return Err(AppError::gateway("Safepay verification response has no data"));
    }

    let state = str_field(&[&data["tracker"]["state"], &data["state"]])
        .ok_or_else(|| AppError::gateway("Safepay verification response has no state"))?
        .to_uppercase();

    let amount = decimal_field(&data["tracker"]["amount"]).or_else(|| decimal_field(&data["amount"]));

    Ok(SettlementState {
        tracker: tracker.to_string(),
        status: classify_state(&state),
        state,
        amount,
        raw,
    })
}

/// Normalize a Safepay webhook body.
///
/// Accepts both the enveloped form (`{"type", "data": {"tracker", "state"}}`)
/// and the flat form (`{"tracker", "event"}`).
pub fn parse_event(payload: &Value) -> Result<WebhookEvent> {
    let data = &payload["data"];

    let tracker = str_field(&[
        &data["tracker"],
        &data["tracker"]["token"],
        &data["token"],
        &payload["tracker"],
        &payload["token"],
    ])
    .ok_or_else(|| AppError::validation("Webhook event has no tracker"))?
    .to_string();

    let event_type = str_field(&[&payload["type"], &payload["event"], &data["event"]])
        .unwrap_or_default()
        .to_lowercase();

    let state = str_field(&[&data["state"], &data["tracker"]["state"], &payload["state"]])
        .unwrap_or_default()
        .to_uppercase();

    let status = if PAID_EVENTS.contains(&event_type.as_str()) || PAID_STATES.contains(&state.as_str())
    {
        WebhookEventStatus::Paid
    } else if FAILED_EVENTS.contains(&event_type.as_str())
        || FAILED_STATES.contains(&state.as_str())
    {
        WebhookEventStatus::Failed
    } else {
        WebhookEventStatus::Unknown
    };

    let amount = decimal_field(&data["amount"]).or_else(|| decimal_field(&payload["amount"]));

    let metadata = [&data["metadata"], &payload["metadata"]]
        .into_iter()
        .find(|v| v.is_object())
        .cloned()
        .unwrap_or(Value::Null);

    Ok(WebhookEvent {
        tracker,
        event_type,
        status,
        amount,
        metadata,
    })
}
