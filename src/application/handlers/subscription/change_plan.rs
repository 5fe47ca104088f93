//! ChangePlanHandler - Upgrades or downgrades a tenant's plan.
//!
//! Limits are recopied from the catalog. The usage ledger is never
//! touched, so a downgrade can leave a tenant over its new limits; the
//! limit gate then refuses new resources until usage falls.

use std::sync::Arc;

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::plan::{get_plan, PlanTier};
use crate::domain::subscription::{PaymentDetails, QuotaError, Subscription};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct ChangePlanCommand {
    pub tenant_id: TenantId,
    pub tier: String,
    /// Required for paid tiers unless a processor reference is on file.
    pub payment: Option<PaymentDetails>,
    pub now: Timestamp,
}

#[derive(Debug, Clone)]
pub struct ChangePlanResult {
    pub previous_tier: PlanTier,
    pub subscription: Subscription,
}

impl ChangePlanResult {
    /// Moved to a tier with smaller limits.
    pub fn is_downgrade(&self) -> bool {
        self.subscription.plan_tier.rank() < self.previous_tier.rank()
    }
}

fn direction(from: PlanTier, to: PlanTier) -> &'static str {
    match to.rank().cmp(&from.rank()) {
        std::cmp::Ordering::Greater => "upgrade",
        std::cmp::Ordering::Less => "downgrade",
        std::cmp::Ordering::Equal => "same_tier",
    }
}

pub struct ChangePlanHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl ChangePlanHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: ChangePlanCommand) -> Result<ChangePlanResult, QuotaError> {
        let plan = get_plan(&cmd.tier)?;
        let mut subscription = self
            .repository
            .find(&cmd.tenant_id)
            .await?
            .ok_or_else(|| QuotaError::subscription_not_found(cmd.tenant_id.clone()))?;
        let previous_tier = subscription.plan_tier;

        let payment = match cmd.payment {
            Some(payment) => Some(payment),
            None if plan.tier.is_paid() && subscription.processor.is_chargeable() => {
                Some(PaymentDetails {
                    currency: subscription.currency,
                    processor: subscription.processor.clone(),
                })
            }
            None if plan.tier.is_paid() => return Err(QuotaError::payment_required(plan.tier)),
            None => None,
        };

        subscription.change_plan(plan, payment, cmd.now)?;
        self.repository.update_lifecycle(&subscription).await?;

        // Re-read so the returned ledger reflects concurrent gate writes.
        let subscription = self
            .repository
            .find(&cmd.tenant_id)
            .await?
            .ok_or_else(|| QuotaError::subscription_not_found(cmd.tenant_id.clone()))?;

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            from = %previous_tier,
            to = %plan.tier,
            direction = direction(previous_tier, plan.tier),
            "Plan changed"
        );

        Ok(ChangePlanResult {
            previous_tier,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::StoreSubscriptionRepository;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::domain::plan::Currency;
    use crate::domain::subscription::{ProcessorReference, ResourceKind, UsageLedger};

    fn tenant() -> TenantId {
        TenantId::new("t1").unwrap()
    }

    fn card() -> PaymentDetails {
        PaymentDetails {
            currency: Currency::Ngn,
            processor: ProcessorReference {
                customer_ref: Some("cus_1".to_string()),
                subscription_ref: Some("sub_1".to_string()),
            },
        }
    }

    async fn setup(ledger: UsageLedger) -> ChangePlanHandler {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repository = Arc::new(StoreSubscriptionRepository::new(store));
        repository
            .create(&Subscription::seeded_free(tenant(), ledger, Timestamp::now()))
            .await
            .unwrap();
        ChangePlanHandler::new(repository)
    }

    fn cmd(tier: &str, payment: Option<PaymentDetails>) -> ChangePlanCommand {
        ChangePlanCommand {
            tenant_id: tenant(),
            tier: tier.to_string(),
            payment,
            now: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn upgrade_then_downgrade_retains_usage() {
        let handler = setup(UsageLedger::new(5, 18)).await;

        let up = handler.handle(cmd("premium", Some(card()))).await.unwrap();
        assert_eq!(up.previous_tier, PlanTier::Free);
        assert!(!up.is_downgrade());
        assert!(up.subscription.has_capacity(ResourceKind::Subject));

        let down = handler.handle(cmd("free", None)).await.unwrap();
        assert_eq!(down.previous_tier, PlanTier::Premium);
        assert!(down.is_downgrade());
        assert_eq!(down.subscription.usage().subjects(), 5);
        assert_eq!(down.subscription.usage().students(), 18);
        assert!(!down.subscription.has_capacity(ResourceKind::Subject));
        assert!(down.subscription.expiry_date.is_none());
    }

    #[tokio::test]
    async fn paid_change_reuses_reference_on_file() {
        let handler = setup(UsageLedger::default()).await;
        handler.handle(cmd("premium", Some(card()))).await.unwrap();

        let vip = handler.handle(cmd("vip", None)).await.unwrap();
        assert_eq!(vip.subscription.plan_tier, PlanTier::Vip);
        assert_eq!(vip.subscription.processor.subscription_ref.as_deref(), Some("sub_1"));
    }

    #[test]
    fn direction_follows_tier_rank() {
        assert_eq!(direction(PlanTier::Free, PlanTier::Vip), "upgrade");
        assert_eq!(direction(PlanTier::Vip, PlanTier::Premium), "downgrade");
        assert_eq!(direction(PlanTier::Premium, PlanTier::Premium), "same_tier");
    }

    #[tokio::test]
    async fn paid_change_without_any_payment_fails() {
        let handler = setup(UsageLedger::default()).await;
        let err = handler.handle(cmd("vip", None)).await.unwrap_err();
        assert!(matches!(err, QuotaError::PaymentRequired { .. }));
    }

    #[tokio::test]
    async fn missing_subscription_fails() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let handler = ChangePlanHandler::new(Arc::new(StoreSubscriptionRepository::new(store)));
        let err = handler.handle(cmd("free", None)).await.unwrap_err();
        assert!(matches!(err, QuotaError::SubscriptionNotFound(_)));
    }
}
