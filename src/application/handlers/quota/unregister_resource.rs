//! UnregisterResourceHandler - Removes a quota-guarded resource and frees
//! its slot.

use std::sync::Arc;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::{QuotaError, ResourceKind};
use crate::ports::ResourceRegistrar;

use super::LimitGate;

#[derive(Debug, Clone)]
pub struct UnregisterResourceCommand {
    pub tenant_id: TenantId,
    pub kind: ResourceKind,
    pub resource_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnregisterResourceResult {
    /// Ledger count after the decrement.
    pub usage: u32,
}

pub struct UnregisterResourceHandler {
    gate: LimitGate,
    registrar: Arc<dyn ResourceRegistrar>,
}

impl UnregisterResourceHandler {
    pub fn new(gate: LimitGate, registrar: Arc<dyn ResourceRegistrar>) -> Self {
        Self { gate, registrar }
    }

    /// The ledger is only decremented after the registrar succeeds.
    pub async fn handle(
        &self,
        cmd: UnregisterResourceCommand,
    ) -> Result<UnregisterResourceResult, QuotaError> {
        self.registrar
            .unregister(&cmd.tenant_id, cmd.kind, &cmd.resource_id)
            .await
            .map_err(|e| QuotaError::registration_failed(e.to_string()))?;

        let usage = self.gate.decrement_usage(&cmd.tenant_id, cmd.kind).await?;
        Ok(UnregisterResourceResult { usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::{StoreResourceRegistrar, StoreSubscriptionRepository};
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::application::handlers::quota::{RegisterResourceCommand, RegisterResourceHandler};
    use crate::domain::foundation::Timestamp;
    use crate::domain::migration::{SubjectSource, TenantScope};
    use crate::domain::subscription::Subscription;
    use crate::ports::SubscriptionRepository;
    use serde_json::Value;

    struct Fixture {
        register: RegisterResourceHandler,
        unregister: UnregisterResourceHandler,
        repository: Arc<StoreSubscriptionRepository>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repository = Arc::new(StoreSubscriptionRepository::new(store.clone()));
        repository
            .create(&Subscription::new_free(tenant(), Timestamp::now()))
            .await
            .unwrap();
        let registrar = Arc::new(StoreResourceRegistrar::new(
            store.clone(),
            TenantScope::Teacher,
            SubjectSource::Subjects,
        ));
        let gate = LimitGate::new(store, repository.clone());
        Fixture {
            register: RegisterResourceHandler::new(gate.clone(), registrar.clone()),
            unregister: UnregisterResourceHandler::new(gate, registrar),
            repository,
        }
    }

    fn tenant() -> TenantId {
        TenantId::new("teacher-1").unwrap()
    }

    #[tokio::test]
    async fn unregister_frees_the_slot() {
        let f = fixture().await;
        let registered = f
            .register
            .handle(RegisterResourceCommand {
                tenant_id: tenant(),
                kind: ResourceKind::Subject,
                attributes: Value::Null,
            })
            .await
            .unwrap();

        let result = f
            .unregister
            .handle(UnregisterResourceCommand {
                tenant_id: tenant(),
                kind: ResourceKind::Subject,
                resource_id: registered.resource_id,
            })
            .await
            .unwrap();

        assert_eq!(result.usage, 0);
    }

    #[tokio::test]
    async fn unknown_resource_leaves_ledger_untouched() {
        let f = fixture().await;
        f.register
            .handle(RegisterResourceCommand {
                tenant_id: tenant(),
                kind: ResourceKind::Subject,
                attributes: Value::Null,
            })
            .await
            .unwrap();

        let err = f
            .unregister
            .handle(UnregisterResourceCommand {
                tenant_id: tenant(),
                kind: ResourceKind::Subject,
                resource_id: "missing".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, QuotaError::RegistrationFailed { .. }));
        let sub = f.repository.find(&tenant()).await.unwrap().unwrap();
        assert_eq!(sub.usage().subjects(), 1);
    }
}
