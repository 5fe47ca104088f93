//! CreateSubscriptionHandler - Registers a tenant on a plan.
//!
//! Free tier needs nothing but the tenant id. Paid tiers need payment
//! details and start a one-month billing period from `now`.

use std::sync::Arc;

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::plan::get_plan;
use crate::domain::subscription::{PaymentDetails, QuotaError, Subscription};
use crate::ports::{CreateOutcome, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub tenant_id: TenantId,
    /// Tier name as entered: free, premium or vip.
    pub tier: String,
    pub payment: Option<PaymentDetails>,
    pub now: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: Subscription,
}

pub struct CreateSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl CreateSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, QuotaError> {
        let plan = get_plan(&cmd.tier)?;

        let subscription = if plan.tier.is_paid() {
            let payment = cmd
                .payment
                .ok_or_else(|| QuotaError::payment_required(plan.tier))?;
            Subscription::new_paid(cmd.tenant_id.clone(), plan, payment, cmd.now)?
        } else {
            Subscription::new_free(cmd.tenant_id.clone(), cmd.now)
        };

        match self.repository.create(&subscription).await? {
            CreateOutcome::Created => {
                tracing::info!(tenant_id = %cmd.tenant_id, tier = %plan.tier, "Subscription created");
                Ok(CreateSubscriptionResult { subscription })
            }
            CreateOutcome::AlreadyExists => Err(QuotaError::subscription_exists(cmd.tenant_id)),
        }
    }
}
