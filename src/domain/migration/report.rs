//! Structured results of the backfill and validation jobs.
//!
//! Per-tenant failures are data, not errors: a batch always completes and
//! hands its failures back in the report.

use serde::Serialize;

use crate::domain::foundation::{BatchRunId, TenantId, Timestamp};

use super::{Tenant, UsageCounts};

/// Identifies a tenant in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRef {
    pub tenant_id: TenantId,
    pub tenant_name: String,
}

impl From<&Tenant> for TenantRef {
    fn from(tenant: &Tenant) -> Self {
        Self {
            tenant_id: tenant.id.clone(),
            tenant_name: tenant.name.clone(),
        }
    }
}

/// One tenant the job could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationItemFailure {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub error: String,
}

impl MigrationItemFailure {
    pub fn new(tenant: &Tenant, error: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant.id.clone(),
            tenant_name: tenant.name.clone(),
            error: error.into(),
        }
    }
}

/// Result of backfilling a single tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    Created,
    /// Subscription already existed, or a concurrent run created it first.
    Skipped,
    Failed(MigrationItemFailure),
}

/// Summary of one backfill run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub run_id: BatchRunId,
    pub started_at: Timestamp,
    pub total: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<MigrationItemFailure>,
}

impl BackfillReport {
    pub fn new(run_id: BatchRunId, started_at: Timestamp) -> Self {
        Self {
            run_id,
            started_at,
            total: 0,
            created: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: BackfillOutcome) {
        self.total += 1;
        match outcome {
            BackfillOutcome::Created => self.created += 1,
            BackfillOutcome::Skipped => self.skipped += 1,
            BackfillOutcome::Failed(failure) => {
                self.failed += 1;
                self.errors.push(failure);
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Ledger that disagrees with ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftEntry {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub expected: UsageCounts,
    pub actual: UsageCounts,
}

/// Result of validating a single tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantCheck {
    Consistent,
    MissingSubscription(TenantRef),
    Drift(DriftEntry),
    Failed(MigrationItemFailure),
}

/// Summary of one validation run. Read-only: nothing is repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub run_id: BatchRunId,
    pub started_at: Timestamp,
    #[serde(rename = "totalTeachers")]
    pub total_tenants: usize,
    /// Tenants checked that had a subscription.
    pub total_subscriptions: usize,
    #[serde(rename = "teachersWithoutSubscriptions")]
    pub tenants_without_subscriptions: Vec<TenantRef>,
    pub subscriptions_with_incorrect_counts: Vec<DriftEntry>,
    pub errors: Vec<MigrationItemFailure>,
}

impl ValidationReport {
    pub fn new(run_id: BatchRunId, started_at: Timestamp) -> Self {
        Self {
            run_id,
            started_at,
            total_tenants: 0,
            total_subscriptions: 0,
            tenants_without_subscriptions: Vec::new(),
            subscriptions_with_incorrect_counts: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, check: TenantCheck) {
        self.total_tenants += 1;
        match check {
            TenantCheck::Consistent => self.total_subscriptions += 1,
            TenantCheck::MissingSubscription(tenant) => {
                self.tenants_without_subscriptions.push(tenant)
            }
            TenantCheck::Drift(entry) => {
                self.total_subscriptions += 1;
                self.subscriptions_with_incorrect_counts.push(entry);
            }
            TenantCheck::Failed(failure) => self.errors.push(failure),
        }
    }

    /// Every tenant has a subscription whose ledger matches ground truth.
    pub fn is_consistent(&self) -> bool {
        self.tenants_without_subscriptions.is_empty()
            && self.subscriptions_with_incorrect_counts.is_empty()
            && self.errors.is_empty()
    }
}
