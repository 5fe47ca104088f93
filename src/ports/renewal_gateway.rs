//! Renewal gateway port.
//!
//! The payment processor is an external collaborator. The lifecycle only
//! needs to ask it to charge one renewal and learn whether that worked.

use async_trait::async_trait;

use crate::domain::foundation::TenantId;
use crate::domain::plan::{Currency, PlanTier};
use crate::domain::subscription::{ProcessorReference, Subscription};

/// Charge request for one billing period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalRequest {
    pub tenant_id: TenantId,
    pub tier: PlanTier,
    pub amount_minor: i64,
    pub currency: Currency,
    pub processor: ProcessorReference,
}

impl RenewalRequest {
    pub fn for_subscription(subscription: &Subscription) -> Self {
        Self {
            tenant_id: subscription.tenant_id.clone(),
            tier: subscription.plan_tier,
            amount_minor: subscription.amount_minor,
            currency: subscription.currency,
            processor: subscription.processor.clone(),
        }
    }
}

/// Processor acknowledgement of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalReceipt {
    pub transaction_ref: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Unknown processor reference: {0}")]
    UnknownReference(String),
}

#[async_trait]
pub trait RenewalGateway: Send + Sync {
    /// Charge one renewal period.
    async fn charge_renewal(&self, request: &RenewalRequest) -> Result<RenewalReceipt, PaymentError>;
}
