//! Exam Quota - Subscription usage quotas for the multi-tenant exam platform
//!
//! Tracks each tenant's plan, subscription lifecycle and subject/student
//! usage, gates resource creation on plan limits, and backfills and
//! reconciles usage ledgers for tenants that predate enforcement.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
