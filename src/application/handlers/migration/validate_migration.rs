//! ValidateMigrationHandler - Reconciles usage ledgers against ground truth.
//!
//! Read-only: reports tenants without a subscription and ledgers whose
//! counters disagree with the directory, and repairs nothing.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::domain::foundation::{BatchRunId, Timestamp};
use crate::domain::migration::{
    DriftEntry, MigrationItemFailure, Tenant, TenantCheck, TenantRef, UsageCounts,
    ValidationReport,
};
use crate::domain::subscription::QuotaError;
use crate::ports::{SubscriptionRepository, TenantDirectory};

pub struct ValidateMigrationHandler {
    directory: Arc<dyn TenantDirectory>,
    repository: Arc<dyn SubscriptionRepository>,
    concurrency: usize,
}

impl ValidateMigrationHandler {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        repository: Arc<dyn SubscriptionRepository>,
        concurrency: usize,
    ) -> Self {
        Self {
            directory,
            repository,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run_validation(&self, now: Timestamp) -> Result<ValidationReport, QuotaError> {
        let run_id = BatchRunId::new();
        let tenants = self.directory.list_tenants().await?;
        tracing::info!(run_id = %run_id, tenants = tenants.len(), "Starting usage validation");

        let checks: Vec<TenantCheck> = stream::iter(tenants.iter())
            .map(|tenant| self.check_tenant(tenant))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = ValidationReport::new(run_id, now);
        for check in checks {
            report.record(check);
        }

        if report.is_consistent() {
            tracing::info!(run_id = %report.run_id, tenants = report.total_tenants, "Usage ledgers consistent");
        } else {
            tracing::warn!(
                run_id = %report.run_id,
                tenants = report.total_tenants,
                missing = report.tenants_without_subscriptions.len(),
                drifted = report.subscriptions_with_incorrect_counts.len(),
                errors = report.errors.len(),
                "Usage ledgers inconsistent"
            );
        }
        Ok(report)
    }

    async fn check_tenant(&self, tenant: &Tenant) -> TenantCheck {
        match self.try_check(tenant).await {
            Ok(check) => check,
            Err(err) => {
                tracing::warn!(tenant_id = %tenant.id, error = %err, "Validation failed for tenant");
                TenantCheck::Failed(MigrationItemFailure::new(tenant, err.to_string()))
            }
        }
    }

    async fn try_check(&self, tenant: &Tenant) -> Result<TenantCheck, QuotaError> {
        let Some(subscription) = self.repository.find(&tenant.id).await? else {
            return Ok(TenantCheck::MissingSubscription(TenantRef::from(tenant)));
        };

        let expected = self.directory.ground_truth(tenant).await?;
        let actual = UsageCounts::from(subscription.usage());
        if expected == actual {
            return Ok(TenantCheck::Consistent);
        }

        tracing::debug!(
            tenant_id = %tenant.id,
            expected_subjects = expected.subjects,
            actual_subjects = actual.subjects,
            expected_students = expected.students,
            actual_students = actual.students,
            "Ledger drift"
        );
        Ok(TenantCheck::Drift(DriftEntry {
            tenant_id: tenant.id.clone(),
            tenant_name: tenant.name.clone(),
            expected,
            actual,
        }))
    }
}
