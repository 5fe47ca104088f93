//! Document store port.
//!
//! The quota engine needs only a handful of document primitives: keyed
//! get and put, insert-if-absent, equality-filtered counts and listings,
//! atomic numeric adds and delete. Anything richer belongs to the
//! collaborators that own the other collections.
//!
//! # Atomicity
//!
//! `atomic_add` and `atomic_add_bounded` must be single atomic operations
//! at the store level. A read followed by a write is not an acceptable
//! implementation: the usage ledger relies on these to stay exact under
//! concurrent requests.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::domain::migration::SubjectSource;
use crate::domain::subscription::QuotaError;

/// A stored document: a JSON object of top-level fields.
pub type Document = serde_json::Map<String, Value>;

/// Named collections the engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Subscriptions,
    Subjects,
    Exams,
    Users,
    Schools,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Subscriptions,
        Collection::Subjects,
        Collection::Exams,
        Collection::Users,
        Collection::Schools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Subscriptions => "subscriptions",
            Collection::Subjects => "subjects",
            Collection::Exams => "exams",
            Collection::Users => "users",
            Collection::Schools => "schools",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<SubjectSource> for Collection {
    fn from(source: SubjectSource) -> Self {
        match source {
            SubjectSource::Subjects => Collection::Subjects,
            SubjectSource::Exams => Collection::Exams,
        }
    }
}

/// How `put` treats an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite only the supplied top-level fields; create if absent.
    Merge,
    /// Replace the whole document.
    Replace,
}

/// Conjunction of top-level field equalities, optionally restricted to
/// ids starting with a prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
    id_prefix: Option<String>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a `field == value` condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn id_prefix(&self) -> Option<&str> {
        self.id_prefix.as_deref()
    }

    /// Evaluates the filter against a document in memory.
    pub fn matches(&self, id: &str, document: &Document) -> bool {
        if let Some(prefix) = &self.id_prefix {
            if !id.starts_with(prefix.as_str()) {
                return false;
            }
        }
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }
}

/// Document together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Document,
}

/// Result of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Result of a conditional add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundedAdd {
    /// The add was applied; carries the new value.
    Applied(i64),
    /// The add would have crossed the limit; nothing was written.
    Rejected { current: i64, limit: i64 },
    /// No document with that id.
    Missing,
}

/// Errors that can occur in document store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("{operation} on {collection} timed out after {timeout_secs}s")]
    Timeout {
        operation: &'static str,
        collection: Collection,
        timeout_secs: u64,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Document {collection}/{id} is malformed: {reason}")]
    Malformed {
        collection: Collection,
        id: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed(collection: Collection, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            collection,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for QuotaError {
    fn from(err: StoreError) -> Self {
        QuotaError::store_unavailable(err.to_string())
    }
}

/// Port for the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write a document, merging or replacing per `mode`.
    async fn put(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError>;

    /// Insert only if no document with `id` exists.
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<CreateOutcome, StoreError>;

    async fn count_where(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;

    /// Matching documents ordered by id.
    async fn list_where(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Atomically add `delta` to a numeric field, flooring the result at 0.
    ///
    /// A missing field counts as 0. Returns the new value, or `None` if the
    /// document does not exist.
    async fn atomic_add(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<Option<i64>, StoreError>;

    /// Atomically add `delta` to `field` only if the result stays at or
    /// below the value of `limit_field` in the same document.
    async fn atomic_add_bounded(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
        limit_field: &str,
    ) -> Result<BoundedAdd, StoreError>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;
}
