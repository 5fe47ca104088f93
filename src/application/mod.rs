//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Writes go through command handlers; `GetUsageHandler` is the only query.

pub mod handlers;

pub use handlers::{
    // Quota
    GetUsageHandler, LimitGate, RegisterResourceHandler, UnregisterResourceHandler,
    // Subscription lifecycle
    CancelSubscriptionHandler, ChangePlanHandler, CreateSubscriptionHandler,
    SweepSubscriptionsHandler,
    // Migration
    MigrateExistingTenantsHandler, MigrationTestHarness, ValidateMigrationHandler,
};
