//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresDocumentStore` - JSONB document store with atomic counter updates

mod document_store;

pub use document_store::PostgresDocumentStore;
