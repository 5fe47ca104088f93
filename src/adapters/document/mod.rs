//! Document adapters - Port implementations layered on `DocumentStore`.
//!
//! These work unchanged over the in-memory and PostgreSQL stores:
//! - `StoreSubscriptionRepository` - Subscriptions keyed by tenant id
//! - `StoreTenantDirectory` - Tenants and ground-truth counts
//! - `StoreResourceRegistrar` - Creates and removes subjects and students

mod resource_registrar;
mod subscription_repository;
mod tenant_directory;

pub use resource_registrar::StoreResourceRegistrar;
pub use subscription_repository::StoreSubscriptionRepository;
pub use tenant_directory::StoreTenantDirectory;
