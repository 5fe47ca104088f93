//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod migration;
pub mod quota;
pub mod subscription;

pub use migration::{
    HarnessReport, MigrateExistingTenantsHandler, MigrationTestHarness, ValidateMigrationHandler,
};
pub use quota::{
    GetUsageHandler, GetUsageQuery, LimitGate, RegisterResourceCommand, RegisterResourceHandler,
    UnregisterResourceCommand, UnregisterResourceHandler, UsageSummary,
};
pub use subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, ChangePlanCommand, ChangePlanHandler,
    CreateSubscriptionCommand, CreateSubscriptionHandler, LifecyclePolicy, SweepReport,
    SweepSubscriptionsCommand, SweepSubscriptionsHandler,
};
