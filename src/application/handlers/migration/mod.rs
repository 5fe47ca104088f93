//! Migration handlers - Backfill, reconciliation and the rehearsal harness.

mod harness;
mod migrate_existing_tenants;
mod validate_migration;

pub use harness::{
    HarnessReport, HarnessStage, LedgerMismatch, MigrationTestHarness, StageResult, StageStatus,
};
pub use migrate_existing_tenants::MigrateExistingTenantsHandler;
pub use validate_migration::ValidateMigrationHandler;
