//! RegisterResourceHandler - Creates a quota-guarded resource.
//!
//! Order of operations:
//! 1. Reserve a slot with the limit gate (conditional atomic increment)
//! 2. Ask the registrar to create the record
//! 3. If the registrar fails, release the slot
//!
//! A refused reservation returns `LimitExceeded` before the registrar is
//! touched, and a failed registration leaves the ledger as it was.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::{QuotaError, ResourceKind};
use crate::ports::ResourceRegistrar;

use super::LimitGate;

/// Command to register one subject or student.
#[derive(Debug, Clone)]
pub struct RegisterResourceCommand {
    pub tenant_id: TenantId,
    pub kind: ResourceKind,
    /// Fields for the new record; owner fields are filled in by the registrar.
    pub attributes: Value,
}

/// Result of successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterResourceResult {
    pub resource_id: String,
    /// Ledger count after the reservation.
    pub usage: u32,
}

pub struct RegisterResourceHandler {
    gate: LimitGate,
    registrar: Arc<dyn ResourceRegistrar>,
}

impl RegisterResourceHandler {
    pub fn new(gate: LimitGate, registrar: Arc<dyn ResourceRegistrar>) -> Self {
        Self { gate, registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterResourceCommand,
    ) -> Result<RegisterResourceResult, QuotaError> {
        let usage = self.gate.acquire(&cmd.tenant_id, cmd.kind).await?;

        match self
            .registrar
            .register(&cmd.tenant_id, cmd.kind, &cmd.attributes)
            .await
        {
            Ok(resource_id) => Ok(RegisterResourceResult { resource_id, usage }),
            Err(registrar_err) => {
                if let Err(release_err) = self.gate.release(&cmd.tenant_id, cmd.kind).await {
                    tracing::warn!(
                        tenant_id = %cmd.tenant_id,
                        resource = %cmd.kind,
                        error = %release_err,
                        "Failed to release reserved capacity; ledger is one ahead until reconciled"
                    );
                }
                Err(QuotaError::registration_failed(registrar_err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::StoreSubscriptionRepository;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::{Subscription, UsageLedger};
    use crate::ports::{RegistrarError, SubscriptionRepository};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockRegistrar {
        fail: bool,
        calls: Mutex<u32>,
    }

    impl MockRegistrar {
        fn ok() -> Self {
            Self { fail: false, calls: Mutex::new(0) }
        }

        fn failing() -> Self {
            Self { fail: true, calls: Mutex::new(0) }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ResourceRegistrar for MockRegistrar {
        async fn register(
            &self,
            _tenant_id: &TenantId,
            _kind: ResourceKind,
            _attributes: &Value,
        ) -> Result<String, RegistrarError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if self.fail {
                Err(RegistrarError::Unavailable("insert failed".to_string()))
            } else {
                Ok(format!("res-{}", calls))
            }
        }

        async fn unregister(
            &self,
            _tenant_id: &TenantId,
            _kind: ResourceKind,
            _resource_id: &str,
        ) -> Result<(), RegistrarError> {
            Ok(())
        }
    }

    fn tenant() -> TenantId {
        TenantId::new("teacher-1").unwrap()
    }

    async fn setup(
        ledger: UsageLedger,
        registrar: Arc<MockRegistrar>,
    ) -> (RegisterResourceHandler, Arc<StoreSubscriptionRepository>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repository = Arc::new(StoreSubscriptionRepository::new(store.clone()));
        repository
            .create(&Subscription::seeded_free(tenant(), ledger, Timestamp::now()))
            .await
            .unwrap();
        let gate = LimitGate::new(store, repository.clone());
        (RegisterResourceHandler::new(gate, registrar), repository)
    }

    fn subject_cmd() -> RegisterResourceCommand {
        RegisterResourceCommand {
            tenant_id: tenant(),
            kind: ResourceKind::Subject,
            attributes: Value::Null,
        }
    }

    async fn subjects(repository: &StoreSubscriptionRepository) -> u32 {
        repository.find(&tenant()).await.unwrap().unwrap().usage().subjects()
    }

    #[tokio::test]
    async fn registers_and_counts() {
        let registrar = Arc::new(MockRegistrar::ok());
        let (handler, repository) = setup(UsageLedger::new(1, 0), registrar.clone()).await;

        let result = handler.handle(subject_cmd()).await.unwrap();

        assert_eq!(result.usage, 2);
        assert_eq!(result.resource_id, "res-1");
        assert_eq!(subjects(&repository).await, 2);
    }

    #[tokio::test]
    async fn limit_refusal_skips_registrar() {
        let registrar = Arc::new(MockRegistrar::ok());
        let (handler, repository) = setup(UsageLedger::new(3, 0), registrar.clone()).await;

        let err = handler.handle(subject_cmd()).await.unwrap_err();

        assert!(matches!(err, QuotaError::LimitExceeded { .. }));
        assert_eq!(registrar.call_count(), 0);
        assert_eq!(subjects(&repository).await, 3);
    }

    #[tokio::test]
    async fn registrar_failure_releases_slot() {
        let registrar = Arc::new(MockRegistrar::failing());
        let (handler, repository) = setup(UsageLedger::new(2, 0), registrar.clone()).await;

        let err = handler.handle(subject_cmd()).await.unwrap_err();

        assert!(matches!(err, QuotaError::RegistrationFailed { .. }));
        assert_eq!(registrar.call_count(), 1);
        assert_eq!(subjects(&repository).await, 2);
    }
}
