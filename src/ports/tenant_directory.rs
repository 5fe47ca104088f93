//! Tenant directory port.
//!
//! Read-only view over the collections that define who the tenants are
//! and how many subjects and students they actually own. The migration
//! jobs treat these counts as ground truth.

use async_trait::async_trait;

use crate::domain::migration::{Tenant, UsageCounts};
use crate::domain::subscription::QuotaError;

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// All tenants, in a stable order.
    async fn list_tenants(&self) -> Result<Vec<Tenant>, QuotaError>;

    /// Subject (or exam) records owned by the tenant.
    async fn count_subjects(&self, tenant: &Tenant) -> Result<u32, QuotaError>;

    /// Active students in the tenant's school. Zero without a school.
    async fn count_active_students(&self, tenant: &Tenant) -> Result<u32, QuotaError>;

    /// Both counts for one tenant.
    async fn ground_truth(&self, tenant: &Tenant) -> Result<UsageCounts, QuotaError> {
        let subjects = self.count_subjects(tenant).await?;
        let students = self.count_active_students(tenant).await?;
        Ok(UsageCounts::new(subjects, students))
    }
}
