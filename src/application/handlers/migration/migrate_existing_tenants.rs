//! MigrateExistingTenantsHandler - Backfills subscriptions for tenants that
//! predate quota enforcement.
//!
//! Every tenant without a subscription gets a free one whose ledger is
//! seeded from ground truth. Tenants that already have one are skipped, so
//! the job can be re-run at any time.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::domain::foundation::{BatchRunId, Timestamp};
use crate::domain::migration::{BackfillOutcome, BackfillReport, MigrationItemFailure, Tenant};
use crate::domain::subscription::{QuotaError, Subscription};
use crate::ports::{CreateOutcome, SubscriptionRepository, TenantDirectory};

pub struct MigrateExistingTenantsHandler {
    directory: Arc<dyn TenantDirectory>,
    repository: Arc<dyn SubscriptionRepository>,
    concurrency: usize,
}

impl MigrateExistingTenantsHandler {
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

    /// Backfill every tenant in the directory.
    ///
    /// # Errors
    ///
    /// Only a failure to list tenants aborts the run. Per-tenant failures
    /// land in the report.
    pub async fn run_backfill(&self, now: Timestamp) -> Result<BackfillReport, QuotaError> {
        let run_id = BatchRunId::new();
        let tenants = self.directory.list_tenants().await?;
        tracing::info!(run_id = %run_id, tenants = tenants.len(), "Starting subscription backfill");

        let outcomes: Vec<BackfillOutcome> = stream::iter(tenants.iter())
            .map(|tenant| self.backfill_tenant(tenant, now))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = BackfillReport::new(run_id, now);
        for outcome in outcomes {
            report.record(outcome);
        }

        tracing::info!(
            run_id = %report.run_id,
            total = report.total,
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            "Subscription backfill finished"
        );
        Ok(report)
    }

    async fn backfill_tenant(&self, tenant: &Tenant, now: Timestamp) -> BackfillOutcome {
        match self.try_backfill(tenant, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    tenant_id = %tenant.id,
                    tenant_name = %tenant.name,
                    error = %err,
                    "Backfill failed for tenant"
                );
                BackfillOutcome::Failed(MigrationItemFailure::new(tenant, err.to_string()))
            }
        }
    }

    async fn try_backfill(
        &self,
        tenant: &Tenant,
        now: Timestamp,
    ) -> Result<BackfillOutcome, QuotaError> {
        if self.repository.find(&tenant.id).await?.is_some() {
            tracing::debug!(tenant_id = %tenant.id, "Subscription exists, skipping");
            return Ok(BackfillOutcome::Skipped);
        }

        let counts = self.directory.ground_truth(tenant).await?;
        let subscription = Subscription::seeded_free(tenant.id.clone(), counts.to_ledger(), now);

        match self.repository.create(&subscription).await? {
            CreateOutcome::Created => {
                tracing::debug!(
                    tenant_id = %tenant.id,
                    subjects = counts.subjects,
                    students = counts.students,
                    "Seeded free subscription"
                );
                Ok(BackfillOutcome::Created)
            }
            CreateOutcome::AlreadyExists => Ok(BackfillOutcome::Skipped),
        }
    }
}
