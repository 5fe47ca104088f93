//! SweepSubscriptionsHandler - Periodic status sweep.
//!
//! For every subscription:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | active, paid, expiry ≤ now, chargeable | charge renewal; success renews one calendar month, failure enters grace |
//! | active, paid, expiry ≤ now, no payment method | enter grace |
//! | grace period, grace end ≤ now | expire; downgrade to free if the policy says so |
//!
//! One tenant's failure is recorded and the sweep moves on. A stored
//! subscription that cannot be decoded is recorded the same way.

use serde::Serialize;
use std::sync::Arc;

use crate::config::{ExpiryPolicy, QuotaConfig};
use crate::domain::foundation::{BatchRunId, TenantId, Timestamp};
use crate::domain::subscription::{QuotaError, Subscription};
use crate::ports::{
    RenewalGateway, RenewalRequest, SubscriptionRepository, UnreadableSubscription,
};

/// Grace and expiry rules applied by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub grace_period_days: u32,
    pub expiry_policy: ExpiryPolicy,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from(&QuotaConfig::default())
    }
}

impl From<&QuotaConfig> for LifecyclePolicy {
    fn from(config: &QuotaConfig) -> Self {
        Self {
            grace_period_days: config.grace_period_days,
            expiry_policy: config.expiry_policy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepSubscriptionsCommand {
    pub now: Timestamp,
}

/// What the sweep did to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    Untouched,
    Renewed,
    EnteredGrace,
    Expired,
    ExpiredAndDowngraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    /// Document id when the subscription could not be decoded.
    pub tenant_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub run_id: BatchRunId,
    pub swept_at: Timestamp,
    pub examined: usize,
    pub renewed: usize,
    pub entered_grace: usize,
    pub expired: usize,
    pub downgraded: usize,
    pub failed: usize,
    pub errors: Vec<SweepFailure>,
}

impl SweepReport {
    fn new(swept_at: Timestamp) -> Self {
        Self {
            run_id: BatchRunId::new(),
            swept_at,
            examined: 0,
            renewed: 0,
            entered_grace: 0,
            expired: 0,
            downgraded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, tenant_id: &TenantId, result: Result<SweepAction, QuotaError>) {
        self.examined += 1;
        match result {
            Ok(SweepAction::Untouched) => {}
            Ok(SweepAction::Renewed) => self.renewed += 1,
            Ok(SweepAction::EnteredGrace) => self.entered_grace += 1,
            Ok(SweepAction::Expired) => self.expired += 1,
            Ok(SweepAction::ExpiredAndDowngraded) => {
                self.expired += 1;
                self.downgraded += 1;
            }
            Err(err) => self.fail(tenant_id.to_string(), err.to_string()),
        }
    }

    fn record_unreadable(&mut self, unreadable: UnreadableSubscription) {
        self.examined += 1;
        self.fail(unreadable.document_id, unreadable.error);
    }

    fn fail(&mut self, tenant_id: String, error: String) {
        self.failed += 1;
        self.errors.push(SweepFailure { tenant_id, error });
    }
}

pub struct SweepSubscriptionsHandler {
    repository: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn RenewalGateway>,
    policy: LifecyclePolicy,
}

impl SweepSubscriptionsHandler {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn RenewalGateway>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            repository,
            gateway,
            policy,
        }
    }

    pub async fn handle(&self, cmd: SweepSubscriptionsCommand) -> Result<SweepReport, QuotaError> {
        let subscriptions = self.repository.list_all().await?;
        let mut report = SweepReport::new(cmd.now);

        for listed in subscriptions {
            let subscription = match listed {
                Ok(subscription) => subscription,
                Err(unreadable) => {
                    tracing::warn!(
                        document_id = %unreadable.document_id,
                        error = %unreadable.error,
                        "Skipping undecodable subscription"
                    );
                    report.record_unreadable(unreadable);
                    continue;
                }
            };
            let tenant_id = subscription.tenant_id.clone();
            let result = self.sweep_one(subscription, cmd.now).await;
            if let Err(err) = &result {
                tracing::warn!(tenant_id = %tenant_id, error = %err, "Sweep failed for subscription");
            }
            report.record(&tenant_id, result);
        }

        tracing::info!(
            run_id = %report.run_id,
            examined = report.examined,
            renewed = report.renewed,
            entered_grace = report.entered_grace,
            expired = report.expired,
            failed = report.failed,
            "Subscription sweep complete"
        );
        Ok(report)
    }

    async fn sweep_one(
        &self,
        mut subscription: Subscription,
        now: Timestamp,
    ) -> Result<SweepAction, QuotaError> {
        let action = if subscription.is_renewal_due(now) {
            self.renew_or_grace(&mut subscription, now).await?
        } else if subscription.is_grace_elapsed(now) {
            subscription.expire(now)?;
            match self.policy.expiry_policy {
                ExpiryPolicy::RetainTier => SweepAction::Expired,
                ExpiryPolicy::DowngradeToFree => {
                    subscription.downgrade_to_free(now)?;
                    SweepAction::ExpiredAndDowngraded
                }
            }
        } else {
            return Ok(SweepAction::Untouched);
        };

        self.repository.update_lifecycle(&subscription).await?;
        Ok(action)
    }

    async fn renew_or_grace(
        &self,
        subscription: &mut Subscription,
        now: Timestamp,
    ) -> Result<SweepAction, QuotaError> {
        if !subscription.processor.is_chargeable() {
            tracing::info!(tenant_id = %subscription.tenant_id, "No payment method on file; entering grace period");
            subscription.enter_grace_period(now, self.policy.grace_period_days)?;
            return Ok(SweepAction::EnteredGrace);
        }

        let request = RenewalRequest::for_subscription(subscription);
        match self.gateway.charge_renewal(&request).await {
            Ok(receipt) => {
                subscription.renew(now)?;
                tracing::info!(
                    tenant_id = %subscription.tenant_id,
                    transaction_ref = %receipt.transaction_ref,
                    "Subscription renewed"
                );
                Ok(SweepAction::Renewed)
            }
            Err(err) => {
                tracing::warn!(
                    tenant_id = %subscription.tenant_id,
                    error = %err,
                    "Renewal charge failed; entering grace period"
                );
                subscription.enter_grace_period(now, self.policy.grace_period_days)?;
                Ok(SweepAction::EnteredGrace)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::StoreSubscriptionRepository;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::adapters::payment::MockRenewalGateway;
    use crate::domain::plan::{Currency, PlanDefinition, PlanTier};
    use crate::domain::subscription::{PaymentDetails, ProcessorReference, SubscriptionStatus};
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap())
    }

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn premium(id: &str, subscription_ref: Option<&str>) -> Subscription {
        Subscription::new_paid(
            tenant(id),
            PlanDefinition::for_tier(PlanTier::Premium),
            PaymentDetails {
                currency: Currency::Ngn,
                processor: ProcessorReference {
                    customer_ref: None,
                    subscription_ref: subscription_ref.map(str::to_string),
                },
            },
            t0(),
        )
        .unwrap()
    }

    struct Fixture {
        repository: Arc<StoreSubscriptionRepository>,
        gateway: Arc<MockRenewalGateway>,
    }

    impl Fixture {
        async fn with(subs: Vec<Subscription>) -> Self {
            let store = Arc::new(InMemoryDocumentStore::new());
            let repository = Arc::new(StoreSubscriptionRepository::new(store));
            for sub in &subs {
                repository.create(sub).await.unwrap();
            }
            Self {
                repository,
                gateway: Arc::new(MockRenewalGateway::new()),
            }
        }

        fn handler(&self, expiry_policy: ExpiryPolicy) -> SweepSubscriptionsHandler {
            SweepSubscriptionsHandler::new(
                self.repository.clone(),
                self.gateway.clone(),
                LifecyclePolicy {
                    grace_period_days: 3,
                    expiry_policy,
                },
            )
        }

        async fn get(&self, id: &str) -> Subscription {
            self.repository.find(&tenant(id)).await.unwrap().unwrap()
        }
    }

    fn at(ts: Timestamp) -> SweepSubscriptionsCommand {
        SweepSubscriptionsCommand { now: ts }
    }

    #[tokio::test]
    async fn renews_due_subscription_by_one_calendar_month() {
        let f = Fixture::with(vec![premium("t1", Some("sub_1"))]).await;
        let expiry = f.get("t1").await.expiry_date.unwrap();

        let report = f.handler(ExpiryPolicy::RetainTier).handle(at(expiry)).await.unwrap();

        assert_eq!(report.renewed, 1);
        let sub = f.get("t1").await;
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.expiry_date, Some(expiry.add_calendar_months(1)));
        assert_eq!(f.gateway.charges().len(), 1);
    }

    #[tokio::test]
    async fn not_yet_due_is_untouched() {
        let f = Fixture::with(vec![premium("t1", Some("sub_1"))]).await;
        let report = f.handler(ExpiryPolicy::RetainTier).handle(at(t0())).await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.renewed + report.entered_grace, 0);
        assert!(f.gateway.charges().is_empty());
    }

    #[tokio::test]
    async fn free_tier_never_swept() {
        let f = Fixture::with(vec![Subscription::new_free(tenant("t1"), t0())]).await;
        let report = f
            .handler(ExpiryPolicy::RetainTier)
            .handle(at(t0().add_days(400)))
            .await
            .unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(f.get("t1").await.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn no_payment_method_enters_three_day_grace() {
        let f = Fixture::with(vec![premium("t1", None)]).await;
        let t = f.get("t1").await.expiry_date.unwrap();

        let report = f.handler(ExpiryPolicy::RetainTier).handle(at(t)).await.unwrap();

        assert_eq!(report.entered_grace, 1);
        let sub = f.get("t1").await;
        assert_eq!(sub.status, SubscriptionStatus::GracePeriod);
        assert_eq!(sub.grace_period_end, Some(t.add_days(3)));
        assert!(f.gateway.charges().is_empty());
    }

    #[tokio::test]
    async fn declined_charge_enters_grace_then_expires() {
        let f = Fixture::with(vec![premium("t1", Some("sub_1"))]).await;
        f.gateway.decline_for(tenant("t1"));
        let t = f.get("t1").await.expiry_date.unwrap();
        let handler = f.handler(ExpiryPolicy::RetainTier);

        handler.handle(at(t)).await.unwrap();
        assert_eq!(f.get("t1").await.status, SubscriptionStatus::GracePeriod);

        handler.handle(at(t.add_days(2))).await.unwrap();
        assert_eq!(f.get("t1").await.status, SubscriptionStatus::GracePeriod);

        let report = handler.handle(at(t.add_days(3).plus_secs(1))).await.unwrap();
        assert_eq!(report.expired, 1);
        let sub = f.get("t1").await;
        assert_eq!(sub.status, SubscriptionStatus::Expired);
        assert_eq!(sub.plan_tier, PlanTier::Premium);
    }

    #[tokio::test]
    async fn downgrade_policy_moves_expired_to_free_keeping_usage() {
        let mut sub = premium("t1", None);
        let t = sub.expiry_date.unwrap();
        sub.enter_grace_period(t, 3).unwrap();
        let f = Fixture::with(vec![sub]).await;

        let report = f
            .handler(ExpiryPolicy::DowngradeToFree)
            .handle(at(t.add_days(4)))
            .await
            .unwrap();

        assert_eq!(report.downgraded, 1);
        let sub = f.get("t1").await;
        assert_eq!(sub.plan_tier, PlanTier::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.subject_limit, 3);
    }

    #[tokio::test]
    async fn undecodable_subscription_is_reported_and_others_still_swept() {
        use crate::ports::{Collection, DocumentStore};
        use serde_json::Value;

        let store = Arc::new(InMemoryDocumentStore::new());
        let repository = Arc::new(StoreSubscriptionRepository::new(store.clone()));
        let good = premium("t1", Some("sub_1"));
        let expiry = good.expiry_date.unwrap();
        repository.create(&good).await.unwrap();

        let mut corrupt = store.get(Collection::Subscriptions, "t1").await.unwrap().unwrap();
        corrupt.insert("tenantId".to_string(), Value::from("t0"));
        corrupt.insert("planTier".to_string(), Value::from("platinum"));
        store.create(Collection::Subscriptions, "t0", corrupt).await.unwrap();

        let gateway = Arc::new(MockRenewalGateway::new());
        let handler = SweepSubscriptionsHandler::new(
            repository.clone(),
            gateway,
            LifecyclePolicy::default(),
        );
        let report = handler.handle(at(expiry)).await.unwrap();

        assert_eq!(report.examined, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].tenant_id, "t0");
        assert!(report.errors[0].error.contains("platinum"));
        assert_eq!(report.renewed, 1);
        let renewed = repository.find(&tenant("t1")).await.unwrap().unwrap();
        assert_eq!(renewed.expiry_date, Some(expiry.add_calendar_months(1)));
    }
}
