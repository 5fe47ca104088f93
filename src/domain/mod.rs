//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `plan` - Plan tiers and the static plan catalog
//! - `subscription` - Subscription lifecycle, usage ledger and quota errors
//! - `migration` - Tenant scope and backfill/validation reports

pub mod foundation;
pub mod migration;
pub mod plan;
pub mod subscription;
