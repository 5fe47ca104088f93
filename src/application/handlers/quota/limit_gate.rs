//! LimitGate - check-then-mutate guard over the usage ledger.
//!
//! Two ways to consume capacity:
//!
//! - `try_acquire` / `release`: a conditional atomic increment that only
//!   succeeds while `current < limit`. Concurrent callers can never push
//!   the counter past the limit.
//! - `check_limit` followed by `increment_usage`: the legacy pair. Each call
//!   is atomic on its own but the pair is not, so two callers can both see
//!   capacity and both increment.
//!
//! Counters never go below zero. Usage above the limit (after a downgrade)
//! blocks new acquisitions but is never trimmed.

use std::sync::Arc;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::{QuotaError, ResourceKind, Subscription};
use crate::ports::{BoundedAdd, Collection, DocumentStore, SubscriptionRepository};

/// Usage ledger gate for one deployment.
#[derive(Clone)]
pub struct LimitGate {
    store: Arc<dyn DocumentStore>,
    repository: Arc<dyn SubscriptionRepository>,
}

impl LimitGate {
    pub fn new(store: Arc<dyn DocumentStore>, repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { store, repository }
    }

    async fn subscription(&self, tenant_id: &TenantId) -> Result<Subscription, QuotaError> {
        self.repository
            .find(tenant_id)
            .await?
            .ok_or_else(|| QuotaError::subscription_not_found(tenant_id.clone()))
    }

    /// True while one more unit of `kind` fits under the tenant's limit.
    ///
    /// Pure read. Subscription status is not consulted.
    pub async fn check_limit(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<bool, QuotaError> {
        let subscription = self.subscription(tenant_id).await?;
        let allowed = subscription.has_capacity(kind);
        tracing::debug!(
            tenant_id = %tenant_id,
            resource = %kind,
            current = subscription.usage().current(kind),
            limit = subscription.limit(kind),
            allowed,
            "Limit check"
        );
        Ok(allowed)
    }

    /// `check_limit` as an error value.
    ///
    /// # Errors
    ///
    /// `LimitExceeded` carrying the current count and limit.
    pub async fn ensure_within_limit(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<(), QuotaError> {
        let subscription = self.subscription(tenant_id).await?;
        if subscription.has_capacity(kind) {
            Ok(())
        } else {
            Err(QuotaError::limit_exceeded(
                tenant_id.clone(),
                kind,
                subscription.usage().current(kind),
                subscription.limit(kind),
            ))
        }
    }

    /// Atomically add one to the counter. Returns the new count.
    pub async fn increment_usage(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<u32, QuotaError> {
        self.add(tenant_id, kind, 1).await
    }

    /// Atomically subtract one, flooring at zero. Returns the new count.
    pub async fn decrement_usage(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<u32, QuotaError> {
        self.add(tenant_id, kind, -1).await
    }

    /// Reserve one unit if it fits under the limit.
    ///
    /// Returns `false` without writing when the tenant is at or over its
    /// limit.
    pub async fn try_acquire(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<bool, QuotaError> {
        match self.acquire(tenant_id, kind).await {
            Ok(_) => Ok(true),
            Err(QuotaError::LimitExceeded { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Reserve one unit, reporting a full ledger as `LimitExceeded`.
    pub async fn acquire(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<u32, QuotaError> {
        let outcome = self
            .store
            .atomic_add_bounded(
                Collection::Subscriptions,
                tenant_id.as_str(),
                kind.ledger_field(),
                1,
                kind.limit_field(),
            )
            .await?;

        match outcome {
            BoundedAdd::Applied(count) => {
                tracing::debug!(tenant_id = %tenant_id, resource = %kind, count, "Capacity acquired");
                Ok(to_count(count))
            }
            BoundedAdd::Rejected { current, limit } => {
                tracing::debug!(tenant_id = %tenant_id, resource = %kind, current, limit, "Capacity refused");
                Err(QuotaError::limit_exceeded(
                    tenant_id.clone(),
                    kind,
                    to_count(current),
                    to_count(limit),
                ))
            }
            BoundedAdd::Missing => Err(QuotaError::subscription_not_found(tenant_id.clone())),
        }
    }

    /// Give back a unit obtained from `try_acquire` or `acquire`.
    pub async fn release(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
    ) -> Result<u32, QuotaError> {
        self.decrement_usage(tenant_id, kind).await
    }

    async fn add(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
        delta: i64,
    ) -> Result<u32, QuotaError> {
        let count = self
            .store
            .atomic_add(
                Collection::Subscriptions,
                tenant_id.as_str(),
                kind.ledger_field(),
                delta,
            )
            .await?
            .ok_or_else(|| QuotaError::subscription_not_found(tenant_id.clone()))?;
        tracing::debug!(tenant_id = %tenant_id, resource = %kind, delta, count, "Usage adjusted");
        Ok(to_count(count))
    }
}

fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::StoreSubscriptionRepository;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::UsageLedger;

    fn tenant() -> TenantId {
        TenantId::new("teacher-1").unwrap()
    }

    async fn gate_with(ledger: UsageLedger) -> LimitGate {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repository = Arc::new(StoreSubscriptionRepository::new(store.clone()));
        repository
            .create(&Subscription::seeded_free(tenant(), ledger, Timestamp::now()))
            .await
            .unwrap();
        LimitGate::new(store, repository)
    }

    #[tokio::test]
    async fn check_limit_allows_below_limit() {
        let gate = gate_with(UsageLedger::new(2, 0)).await;
        assert!(gate.check_limit(&tenant(), ResourceKind::Subject).await.unwrap());
    }

    #[tokio::test]
    async fn check_limit_blocks_at_limit() {
        let gate = gate_with(UsageLedger::new(3, 10)).await;
        assert!(!gate.check_limit(&tenant(), ResourceKind::Subject).await.unwrap());
        assert!(!gate.check_limit(&tenant(), ResourceKind::Student).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let gate = gate_with(UsageLedger::default()).await;
        let other = TenantId::new("nobody").unwrap();

        assert!(matches!(
            gate.check_limit(&other, ResourceKind::Subject).await,
            Err(QuotaError::SubscriptionNotFound(_))
        ));
        assert!(matches!(
            gate.increment_usage(&other, ResourceKind::Subject).await,
            Err(QuotaError::SubscriptionNotFound(_))
        ));
        assert!(matches!(
            gate.try_acquire(&other, ResourceKind::Subject).await,
            Err(QuotaError::SubscriptionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn ensure_within_limit_reports_counts() {
        let gate = gate_with(UsageLedger::new(3, 0)).await;
        let err = gate
            .ensure_within_limit(&tenant(), ResourceKind::Subject)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuotaError::LimitExceeded { current: 3, limit: 3, resource: ResourceKind::Subject, .. }
        ));
    }

    #[tokio::test]
    async fn increment_and_decrement_adjust_counter() {
        let gate = gate_with(UsageLedger::new(1, 0)).await;
        assert_eq!(gate.increment_usage(&tenant(), ResourceKind::Subject).await.unwrap(), 2);
        assert_eq!(gate.decrement_usage(&tenant(), ResourceKind::Subject).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn decrement_never_goes_negative() {
        let gate = gate_with(UsageLedger::default()).await;
        assert_eq!(gate.decrement_usage(&tenant(), ResourceKind::Student).await.unwrap(), 0);
        assert_eq!(gate.decrement_usage(&tenant(), ResourceKind::Student).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn try_acquire_stops_at_limit() {
        let gate = gate_with(UsageLedger::new(2, 0)).await;
        assert!(gate.try_acquire(&tenant(), ResourceKind::Subject).await.unwrap());
        assert!(!gate.try_acquire(&tenant(), ResourceKind::Subject).await.unwrap());
        assert!(!gate.check_limit(&tenant(), ResourceKind::Subject).await.unwrap());
    }

    #[tokio::test]
    async fn over_limit_ledger_blocks_but_is_kept() {
        let gate = gate_with(UsageLedger::new(5, 18)).await;
        assert!(!gate.try_acquire(&tenant(), ResourceKind::Subject).await.unwrap());
        assert_eq!(gate.release(&tenant(), ResourceKind::Subject).await.unwrap(), 4);
        assert!(!gate.try_acquire(&tenant(), ResourceKind::Subject).await.unwrap());
    }
}
