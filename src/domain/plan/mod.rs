//! Plan catalog module.
//!
//! Static table of plan tiers and the limits and prices attached to them.
//! Pure data: a subscription copies its limits out of here when it is
//! created or changes tier, and never reads the catalog again.
//!
//! # Module Structure
//!
//! - `tier` - PlanTier enumeration
//! - `catalog` - PlanDefinition table and lookup

mod catalog;
mod tier;

pub use catalog::{get_plan, Currency, PlanDefinition, PlanPrice};
pub use tier::PlanTier;
