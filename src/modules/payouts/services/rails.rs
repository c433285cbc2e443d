use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Currency, Result};
use crate::modules::sellers::{PayoutMethod, RecipientDetails};

/// What a rail needs to know about the payout besides amount and recipient
#[derive(Debug, Clone)]
pub struct PayoutContext {
    pub payout_id: String,
    /// Internal reference, sent as the idempotency key where the rail supports one
    pub reference: String,
    pub seller_id: String,
    pub currency: Currency,
}

/// Result of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    Completed { external_ref: String },
    Failed { reason: String },
    /// No automated rail; an operator must move the money and finalize the payout
    ManualRequired { reason: String },
}

/// One way of moving money to a seller
#[async_trait]
pub trait PayoutRail: Send + Sync {
    fn method(&self) -> PayoutMethod;

    /// Attempt the transfer.
    ///
    /// `Err` means the outcome is unknown to the rail (transport error);
    /// business declines are `Ok(TransferOutcome::Failed)`.
    async fn attempt_transfer(
        &self,
        recipient: &RecipientDetails,
        amount: Decimal,
        context: &PayoutContext,
    ) -> Result<TransferOutcome>;
}

/// Resolves a payout method to its rail
#[derive(Default, Clone)]
pub struct RailRegistry {
    rails: HashMap<PayoutMethod, Arc<dyn PayoutRail>>,
}

impl RailRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rail(mut self, rail: Arc<dyn PayoutRail>) -> Self {
        self.register(rail);
        self
    }

    pub fn register(&mut self, rail: Arc<dyn PayoutRail>) {
        self.rails.insert(rail.method(), rail);
    }

    pub fn supports(&self, method: PayoutMethod) -> bool {
        self.rails.contains_key(&method)
    }

    /// Dispatch to the rail for `method`. Never fails: unregistered methods
    /// come back as `ManualRequired` and rail errors as `Failed`.
    pub async fn dispatch(
        &self,
        method: PayoutMethod,
        recipient: &RecipientDetails,
        amount: Decimal,
        context: &PayoutContext,
    ) -> TransferOutcome {
        let Some(rail) = self.rails.get(&method) else {
            return TransferOutcome::ManualRequired {
                reason: format!("Manual payout required: no automated {} rail", method),
            };
        };

        match rail.attempt_transfer(recipient, amount, context).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    payout_id = %context.payout_id,
                    method = %method,
                    error = %e,
                    "Payout rail error"
                );
                TransferOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
