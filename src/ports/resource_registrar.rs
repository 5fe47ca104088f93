//! Resource registrar port.
//!
//! Creates and removes the quota-guarded domain records (subjects, exams,
//! students). The limit gate reserves a slot first and calls the
//! registrar second, releasing the slot if the registrar fails.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::ResourceKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistrarError {
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Registrar unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ResourceRegistrar: Send + Sync {
    /// Create the record. Returns its id.
    async fn register(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
        attributes: &Value,
    ) -> Result<String, RegistrarError>;

    /// Remove the record.
    async fn unregister(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<(), RegistrarError>;
}
