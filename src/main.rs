//! Exam Quota operator CLI
//!
//! Runs the offline quota jobs against the configured document store and
//! prints each job's report as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! exam-quota backfill
//! exam-quota validate
//! exam-quota sweep --simulate-approved-charges
//! exam-quota harness --keep-data
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;

use exam_quota::adapters::{
    MockRenewalGateway, PostgresDocumentStore, StoreSubscriptionRepository, StoreTenantDirectory,
};
use exam_quota::application::handlers::migration::{
    MigrateExistingTenantsHandler, MigrationTestHarness, ValidateMigrationHandler,
};
use exam_quota::application::handlers::subscription::{
    LifecyclePolicy, SweepSubscriptionsCommand, SweepSubscriptionsHandler,
};
use exam_quota::config::AppConfig;
use exam_quota::domain::foundation::Timestamp;
use exam_quota::ports::{DocumentStore, RenewalGateway, SubscriptionRepository};
use exam_quota::telemetry;

#[derive(Parser)]
#[command(name = "exam-quota")]
#[command(version)]
#[command(about = "Subscription usage-quota jobs", long_about = None)]
struct Cli {
    /// Apply pending schema migrations before running the job
    #[arg(long, env = "EXAM_QUOTA_MIGRATE")]
    migrate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create free subscriptions, seeded from ground truth, for tenants without one
    Backfill,
    /// Compare every usage ledger against ground truth without repairing
    Validate,
    /// Renew due subscriptions and expire elapsed grace periods
    Sweep {
        /// Approve every renewal charge instead of failing it
        #[arg(long)]
        simulate_approved_charges: bool,
    },
    /// Rehearse backfill and validation against synthetic tenants
    Harness {
        /// Leave the synthetic records in place
        #[arg(long)]
        keep_data: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Runs one job. `Ok(false)` means the job finished but reported problems.
async fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init(&config.telemetry)?;

    let postgres = PostgresDocumentStore::connect(&config.database).await?;
    if cli.migrate || config.database.run_migrations {
        postgres.run_migrations().await?;
    }
    let store: Arc<dyn DocumentStore> = Arc::new(postgres);
    let repository: Arc<dyn SubscriptionRepository> =
        Arc::new(StoreSubscriptionRepository::new(store.clone()));
    let directory = Arc::new(StoreTenantDirectory::new(
        store.clone(),
        config.quota.tenant_scope,
        config.quota.subject_source,
    ));
    let now = Timestamp::now();

    match cli.command {
        Commands::Backfill => {
            let handler = MigrateExistingTenantsHandler::new(
                directory,
                repository,
                config.migration.concurrency,
            );
            let report = handler.run_backfill(now).await?;
            print_report(&report)?;
            Ok(report.is_clean())
        }
        Commands::Validate => {
            let handler =
                ValidateMigrationHandler::new(directory, repository, config.migration.concurrency);
            let report = handler.run_validation(now).await?;
            print_report(&report)?;
            Ok(report.is_consistent())
        }
        Commands::Sweep {
            simulate_approved_charges,
        } => {
            let gateway: Arc<dyn RenewalGateway> = if simulate_approved_charges {
                tracing::warn!("Renewal charges are simulated and always approved");
                Arc::new(MockRenewalGateway::new())
            } else {
                tracing::warn!("No payment processor wired; due renewals will enter grace");
                Arc::new(MockRenewalGateway::unavailable())
            };
            let handler = SweepSubscriptionsHandler::new(
                repository,
                gateway,
                LifecyclePolicy::from(&config.quota),
            );
            let report = handler.handle(SweepSubscriptionsCommand { now }).await?;
            print_report(&report)?;
            Ok(report.failed == 0)
        }
        Commands::Harness { keep_data } => {
            let harness = MigrationTestHarness::new(
                store,
                config.quota.tenant_scope,
                config.quota.subject_source,
                config.migration.test_id_prefix.clone(),
                config.migration.concurrency,
            )
            .keep_data(keep_data);
            let report = harness.run(now).await;
            print_report(&report)?;
            Ok(report.passed())
        }
    }
}

fn print_report<T: Serialize>(report: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
