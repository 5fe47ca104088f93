//! MigrationTestHarness - End-to-end rehearsal of the backfill against
//! synthetic tenants.
//!
//! Seeds four tenants with known subject and student counts under a
//! reserved id prefix, runs backfill and validation restricted to that
//! prefix, checks every seeded ledger against a fixed table, and deletes
//! everything it created.
//!
//! Every synthetic record id starts with the prefix, so cleanup never
//! touches real data.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adapters::document::{StoreSubscriptionRepository, StoreTenantDirectory};
use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::migration::{
    BackfillReport, SubjectSource, TenantScope, UsageCounts, ValidationReport,
};
use crate::domain::subscription::QuotaError;
use crate::ports::{Collection, Document, DocumentStore, Filter, SubscriptionRepository, WriteMode};

use super::{MigrateExistingTenantsHandler, ValidateMigrationHandler};

/// One synthetic tenant: index, subjects, active students.
const FIXTURES: [(u32, u32, u32); 4] = [(1, 0, 0), (2, 2, 5), (3, 3, 10), (4, 5, 15)];

/// School that also receives one inactive student.
const INACTIVE_STUDENT_FIXTURE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessStage {
    Setup,
    Migrate,
    Validate,
    Verify,
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: HarnessStage,
    pub status: StageStatus,
    pub detail: String,
}

/// Seeded ledger that does not match the fixture table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMismatch {
    pub tenant_id: TenantId,
    pub expected: UsageCounts,
    /// None when no subscription was created.
    pub actual: Option<UsageCounts>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessReport {
    pub stages: Vec<StageResult>,
    pub backfill: Option<BackfillReport>,
    pub validation: Option<ValidationReport>,
    pub mismatches: Vec<LedgerMismatch>,
    pub records_deleted: usize,
}

impl HarnessReport {
    pub fn passed(&self) -> bool {
        self.stages
            .iter()
            .all(|stage| stage.status != StageStatus::Failed)
    }
}

pub struct MigrationTestHarness {
    store: Arc<dyn DocumentStore>,
    scope: TenantScope,
    subjects: Collection,
    prefix: String,
    keep_data: bool,
    backfill: MigrateExistingTenantsHandler,
    validation: ValidateMigrationHandler,
    repository: Arc<dyn SubscriptionRepository>,
}

impl MigrationTestHarness {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        scope: TenantScope,
        source: SubjectSource,
        prefix: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        let prefix = prefix.into();
        let repository: Arc<dyn SubscriptionRepository> =
            Arc::new(StoreSubscriptionRepository::new(store.clone()));
        let directory = Arc::new(
            StoreTenantDirectory::new(store.clone(), scope, source).with_id_prefix(prefix.clone()),
        );
        Self {
            store,
            scope,
            subjects: Collection::from(source),
            backfill: MigrateExistingTenantsHandler::new(
                directory.clone(),
                repository.clone(),
                concurrency,
            ),
            validation: ValidateMigrationHandler::new(directory, repository.clone(), concurrency),
            repository,
            prefix,
            keep_data: false,
        }
    }

    /// Leave the synthetic records in place after `run`.
    pub fn keep_data(mut self, keep: bool) -> Self {
        self.keep_data = keep;
        self
    }

    fn teacher_id(&self, n: u32) -> String {
        format!("{}teacher{}", self.prefix, n)
    }

    fn school_id(&self, n: u32) -> String {
        format!("{}school{}", self.prefix, n)
    }

    fn tenant_id(&self, n: u32) -> String {
        match self.scope {
            TenantScope::Teacher => self.teacher_id(n),
            TenantScope::School => self.school_id(n),
        }
    }

    async fn insert(&self, collection: Collection, id: &str, body: Value) -> Result<(), QuotaError> {
        let document: Document = match body {
            Value::Object(map) => map,
            _ => Document::new(),
        };
        self.store.put(collection, id, document, WriteMode::Replace).await?;
        Ok(())
    }

    /// Seed the synthetic tenants. Leftovers from an earlier run are
    /// removed first.
    pub async fn setup_test_environment(&self) -> Result<usize, QuotaError> {
        self.cleanup_test_data().await?;
        let mut created = 0;

        for (n, subjects, students) in FIXTURES {
            let school = self.school_id(n);
            let teacher = self.teacher_id(n);

            self.insert(Collection::Schools, &school, json!({ "name": format!("Test School {}", n) }))
                .await?;
            self.insert(
                Collection::Users,
                &teacher,
                json!({
                    "role": "teacher",
                    "displayName": format!("Test Teacher {}", n),
                    "schoolId": school,
                }),
            )
            .await?;
            created += 2;

            for s in 0..subjects {
                self.insert(
                    self.subjects,
                    &format!("{}subject{}_{}", self.prefix, n, s),
                    json!({ "name": format!("Subject {}", s), "teacherId": teacher, "schoolId": school }),
                )
                .await?;
                created += 1;
            }

            for s in 0..students {
                self.insert(
                    Collection::Users,
                    &format!("{}student{}_{}", self.prefix, n, s),
                    json!({ "role": "student", "schoolId": school, "isActive": true }),
                )
                .await?;
                created += 1;
            }
        }

        let school = self.school_id(INACTIVE_STUDENT_FIXTURE);
        self.insert(
            Collection::Users,
            &format!("{}student{}_inactive", self.prefix, INACTIVE_STUDENT_FIXTURE),
            json!({ "role": "student", "schoolId": school, "isActive": false }),
        )
        .await?;
        created += 1;

        tracing::info!(prefix = %self.prefix, records = created, "Test environment seeded");
        Ok(created)
    }

    /// Delete every record whose id carries the prefix. Returns the number
    /// deleted.
    pub async fn cleanup_test_data(&self) -> Result<usize, QuotaError> {
        let filter = Filter::all().with_id_prefix(self.prefix.clone());
        let mut deleted = 0;

        for collection in [
            Collection::Subscriptions,
            Collection::Users,
            self.subjects,
            Collection::Schools,
        ] {
            for stored in self.store.list_where(collection, &filter).await? {
                if self.store.delete(collection, &stored.id).await? {
                    deleted += 1;
                }
            }
        }

        tracing::info!(prefix = %self.prefix, deleted, "Test data removed");
        Ok(deleted)
    }

    /// Compare each synthetic ledger to the fixture table.
    pub async fn verify_test_migration(&self) -> Result<Vec<LedgerMismatch>, QuotaError> {
        let mut mismatches = Vec::new();
        for (n, subjects, students) in FIXTURES {
            let tenant_id = TenantId::new(self.tenant_id(n))?;
            let expected = UsageCounts::new(subjects, students);
            let actual = self
                .repository
                .find(&tenant_id)
                .await?
                .map(|subscription| UsageCounts::from(subscription.usage()));

            if actual != Some(expected) {
                mismatches.push(LedgerMismatch {
                    tenant_id,
                    expected,
                    actual,
                });
            }
        }
        Ok(mismatches)
    }

    /// Setup, migrate, validate, verify, then clean up.
    ///
    /// Once setup has seeded the tenants, migrate, validate and verify all
    /// run and are judged on their own results. A failed setup skips those
    /// three. Cleanup always runs unless data is kept.
    pub async fn run(&self, now: Timestamp) -> HarnessReport {
        let mut report = HarnessReport {
            stages: Vec::new(),
            backfill: None,
            validation: None,
            mismatches: Vec::new(),
            records_deleted: 0,
        };

        let seeded = match self.setup_test_environment().await {
            Ok(count) => record(&mut report, HarnessStage::Setup, true, format!("{} records seeded", count)),
            Err(err) => record(&mut report, HarnessStage::Setup, false, err.to_string()),
        };

        if seeded {
            self.migrate_stage(&mut report, now).await;
            self.validate_stage(&mut report, now).await;
            self.verify_stage(&mut report).await;
        } else {
            for stage in [HarnessStage::Migrate, HarnessStage::Validate, HarnessStage::Verify] {
                skip(&mut report, stage);
            }
        }

        if self.keep_data {
            report.stages.push(StageResult {
                stage: HarnessStage::Cleanup,
                status: StageStatus::Skipped,
                detail: "test data kept".to_string(),
            });
        } else {
            match self.cleanup_test_data().await {
                Ok(deleted) => {
                    report.records_deleted = deleted;
                    record(&mut report, HarnessStage::Cleanup, true, format!("{} records deleted", deleted));
                }
                Err(err) => {
                    record(&mut report, HarnessStage::Cleanup, false, err.to_string());
                }
            }
        }

        if report.passed() {
            tracing::info!(prefix = %self.prefix, "Migration harness passed");
        } else {
            tracing::warn!(prefix = %self.prefix, "Migration harness failed");
        }
        report
    }

    async fn migrate_stage(&self, report: &mut HarnessReport, now: Timestamp) {
        match self.backfill.run_backfill(now).await {
            Ok(backfill) => {
                let ok = backfill.is_clean() && backfill.created == FIXTURES.len();
                let detail = format!(
                    "{} created, {} skipped, {} failed",
                    backfill.created, backfill.skipped, backfill.failed
                );
                report.backfill = Some(backfill);
                record(report, HarnessStage::Migrate, ok, detail);
            }
            Err(err) => {
                record(report, HarnessStage::Migrate, false, err.to_string());
            }
        }
    }

    async fn validate_stage(&self, report: &mut HarnessReport, now: Timestamp) {
        match self.validation.run_validation(now).await {
            Ok(validation) => {
                let ok = validation.is_consistent();
                let detail = format!(
                    "{} tenants, {} missing, {} drifted",
                    validation.total_tenants,
                    validation.tenants_without_subscriptions.len(),
                    validation.subscriptions_with_incorrect_counts.len()
                );
                report.validation = Some(validation);
                record(report, HarnessStage::Validate, ok, detail);
            }
            Err(err) => {
                record(report, HarnessStage::Validate, false, err.to_string());
            }
        }
    }

    async fn verify_stage(&self, report: &mut HarnessReport) {
        match self.verify_test_migration().await {
            Ok(mismatches) => {
                let ok = mismatches.is_empty();
                let detail = format!("{} mismatched ledgers", mismatches.len());
                report.mismatches = mismatches;
                record(report, HarnessStage::Verify, ok, detail);
            }
            Err(err) => {
                record(report, HarnessStage::Verify, false, err.to_string());
            }
        }
    }
}

fn record(report: &mut HarnessReport, stage: HarnessStage, passed: bool, detail: String) -> bool {
    if !passed {
        tracing::warn!(stage = ?stage, detail = %detail, "Harness stage failed");
    }
    report.stages.push(StageResult {
        stage,
        status: if passed { StageStatus::Passed } else { StageStatus::Failed },
        detail,
    });
    passed
}

fn skip(report: &mut HarnessReport, stage: HarnessStage) {
    report.stages.push(StageResult {
        stage,
        status: StageStatus::Skipped,
        detail: "setup failed".to_string(),
    });
}
