//! Quota handlers - The limit gate and the operations built on it.

mod get_usage;
mod limit_gate;
mod register_resource;
mod unregister_resource;

pub use get_usage::{GetUsageHandler, GetUsageQuery, ResourceUsage, UsageSummary};
pub use limit_gate::LimitGate;
pub use register_resource::{
    RegisterResourceCommand, RegisterResourceHandler, RegisterResourceResult,
};
pub use unregister_resource::{
    UnregisterResourceCommand, UnregisterResourceHandler, UnregisterResourceResult,
};
