//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the quota engine and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `DocumentStore` - Document primitives, including atomic counter adds
//! - `SubscriptionRepository` - Typed subscription persistence
//! - `TenantDirectory` - Tenants and their ground-truth counts
//!
//! ## Collaborator Ports
//!
//! - `RenewalGateway` - Charges a renewal through the payment processor
//! - `ResourceRegistrar` - Creates and removes quota-guarded records

mod document_store;
mod renewal_gateway;
mod resource_registrar;
mod subscription_repository;
mod tenant_directory;

pub use document_store::{
    BoundedAdd, Collection, CreateOutcome, Document, DocumentStore, Filter, StoreError,
    StoredDocument, WriteMode,
};
pub use renewal_gateway::{PaymentError, RenewalGateway, RenewalReceipt, RenewalRequest};
pub use resource_registrar::{RegistrarError, ResourceRegistrar};
pub use subscription_repository::{
    ListedSubscription, SubscriptionRepository, UnreadableSubscription,
};
pub use tenant_directory::TenantDirectory;
