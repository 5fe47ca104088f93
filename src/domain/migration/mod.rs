//! Migration domain module.
//!
//! Vocabulary for the offline backfill and reconciliation jobs: who the
//! tenants are, where their ground truth lives, and the reports the jobs
//! produce.
//!
//! # Module Structure
//!
//! - `scope` - Tenant scope, subject source, tenant records and counts
//! - `report` - Backfill and validation reports

mod report;
mod scope;

pub use report::{
    BackfillOutcome, BackfillReport, DriftEntry, MigrationItemFailure, TenantCheck, TenantRef,
    ValidationReport,
};
pub use scope::{SubjectSource, Tenant, TenantScope, UsageCounts};
