//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the quota engine to external systems:
//! - `memory` - In-process document store
//! - `postgres` - JSONB document store on PostgreSQL
//! - `document` - Repository, tenant directory and registrar over any document store
//! - `payment` - Renewal gateway stand-in

pub mod document;
pub mod memory;
pub mod payment;
pub mod postgres;

pub use document::{StoreResourceRegistrar, StoreSubscriptionRepository, StoreTenantDirectory};
pub use memory::InMemoryDocumentStore;
pub use payment::MockRenewalGateway;
pub use postgres::PostgresDocumentStore;
