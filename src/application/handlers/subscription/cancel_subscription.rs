//! CancelSubscriptionHandler - Cancels a tenant's subscription.
//!
//! Tier, limits and usage stay as they are. A cancelled tenant can
//! re-subscribe or be moved to the free tier with `ChangePlanHandler`.

use std::sync::Arc;

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::subscription::{QuotaError, Subscription};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub tenant_id: TenantId,
    pub now: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: Subscription,
}

pub struct CancelSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl CancelSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, QuotaError> {
        let mut subscription = self
            .repository
            .find(&cmd.tenant_id)
            .await?
            .ok_or_else(|| QuotaError::subscription_not_found(cmd.tenant_id.clone()))?;

        subscription.cancel(cmd.now)?;
        self.repository.update_lifecycle(&subscription).await?;

        tracing::info!(tenant_id = %cmd.tenant_id, "Subscription cancelled");
        Ok(CancelSubscriptionResult { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::StoreSubscriptionRepository;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::domain::subscription::SubscriptionStatus;

    async fn setup() -> (CancelSubscriptionHandler, Arc<StoreSubscriptionRepository>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repository = Arc::new(StoreSubscriptionRepository::new(store));
        repository
            .create(&Subscription::new_free(TenantId::new("t1").unwrap(), Timestamp::now()))
            .await
            .unwrap();
        (CancelSubscriptionHandler::new(repository.clone()), repository)
    }

    fn cmd() -> CancelSubscriptionCommand {
        CancelSubscriptionCommand {
            tenant_id: TenantId::new("t1").unwrap(),
            now: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn cancels_and_persists() {
        let (handler, repository) = setup().await;
        handler.handle(cmd()).await.unwrap();

        let stored = repository.find(&cmd().tenant_id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Cancelled);
        assert!(stored.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn cancelling_twice_is_invalid_state() {
        let (handler, _) = setup().await;
        handler.handle(cmd()).await.unwrap();
        let err = handler.handle(cmd()).await.unwrap_err();
        assert!(matches!(err, QuotaError::InvalidState { .. }));
    }
}
