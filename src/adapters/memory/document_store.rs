//! In-memory document store implementation.
//!
//! This adapter provides an in-process implementation of the
//! `DocumentStore` port. Useful for:
//! - Unit and integration tests
//! - Running the migration harness without a database
//!
//! All collections sit behind one `tokio::sync::RwLock`; every mutating
//! operation holds the write lock for its whole read-modify-write, which
//! makes the atomic adds atomic.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::ports::{
    BoundedAdd, Collection, CreateOutcome, Document, DocumentStore, Filter, StoreError,
    StoredDocument, WriteMode,
};

type Collections = BTreeMap<Collection, BTreeMap<String, Document>>;

/// In-memory implementation of the DocumentStore port.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryDocumentStore::new();
/// store.create(Collection::Subscriptions, "teacher-1", doc).await?;
/// let next = store
///     .atomic_add_bounded(Collection::Subscriptions, "teacher-1", "currentSubjects", 1, "subjectLimit")
///     .await?;
/// ```
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    /// Removes every document from every collection.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

fn read_integer(
    collection: Collection,
    id: &str,
    document: &Document,
    field: &str,
) -> Result<i64, StoreError> {
    match document.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value.as_i64().ok_or_else(|| {
            StoreError::malformed(collection, id, format!("field '{}' is not an integer", field))
        }),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        match mode {
            WriteMode::Replace => {
                docs.insert(id.to_string(), document);
            }
            WriteMode::Merge => {
                let existing = docs.entry(id.to_string()).or_default();
                existing.extend(document);
            }
        }
        Ok(())
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<CreateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        docs.insert(id.to_string(), document);
        Ok(CreateOutcome::Created)
    }

    async fn count_where(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let count = collections.get(&collection).map_or(0, |docs| {
            docs.iter()
                .filter(|(id, doc)| filter.matches(id, doc))
                .count()
        });
        Ok(count as u64)
    }

    async fn list_where(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(id, doc)| filter.matches(id, doc))
            .map(|(id, doc)| StoredDocument {
                id: id.clone(),
                body: doc.clone(),
            })
            .collect())
    }

    async fn atomic_add(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<Option<i64>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(None);
        };
        let current = read_integer(collection, id, doc, field)?;
        let next = current.saturating_add(delta).max(0);
        doc.insert(field.to_string(), Value::from(next));
        Ok(Some(next))
    }

    async fn atomic_add_bounded(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: i64,
        limit_field: &str,
    ) -> Result<BoundedAdd, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(BoundedAdd::Missing);
        };
        let current = read_integer(collection, id, doc, field)?;
        let next = current.saturating_add(delta).max(0);
        // Releases never consult the limit.
        if delta > 0 {
            if !doc.contains_key(limit_field) {
                return Err(StoreError::malformed(
                    collection,
                    id,
                    format!("limit field '{}' is missing", limit_field),
                ));
            }
            let limit = read_integer(collection, id, doc, limit_field)?;
            if next > limit {
                return Ok(BoundedAdd::Rejected { current, limit });
            }
        }
        doc.insert(field.to_string(), Value::from(next));
        Ok(BoundedAdd::Applied(next))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .map_or(false, |docs| docs.remove(id).is_some()))
    }
}
