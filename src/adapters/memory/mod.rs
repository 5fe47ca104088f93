//! In-memory adapters for tests and database-free runs.

mod document_store;

pub use document_store::InMemoryDocumentStore;
