//! Document-backed implementation of TenantDirectory.
//!
//! # Collections read
//!
//! | Scope | Tenants | Subjects owned by | Students |
//! |-------|---------|-------------------|----------|
//! | Teacher | `users` with `role = teacher` | `teacherId` | `users` with `role = student`, `isActive = true`, teacher's `schoolId` |
//! | School | `schools` | `schoolId` | same, tenant id as `schoolId` |

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::foundation::TenantId;
use crate::domain::migration::{SubjectSource, Tenant, TenantScope};
use crate::domain::subscription::QuotaError;
use crate::ports::{Collection, Document, DocumentStore, Filter, StoredDocument, TenantDirectory};

pub(crate) const ROLE_FIELD: &str = "role";
pub(crate) const SCHOOL_FIELD: &str = "schoolId";
pub(crate) const ACTIVE_FIELD: &str = "isActive";
pub(crate) const TEACHER_ROLE: &str = "teacher";
pub(crate) const STUDENT_ROLE: &str = "student";

/// TenantDirectory over any DocumentStore.
pub struct StoreTenantDirectory {
    store: Arc<dyn DocumentStore>,
    scope: TenantScope,
    subjects: Collection,
    id_prefix: Option<String>,
}

impl StoreTenantDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, scope: TenantScope, source: SubjectSource) -> Self {
        Self {
            store,
            scope,
            subjects: Collection::from(source),
            id_prefix: None,
        }
    }

    /// Restricts `list_tenants` to ids starting with `prefix`.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    fn tenant_filter(&self) -> Filter {
        let filter = match self.scope {
            TenantScope::Teacher => Filter::all().eq(ROLE_FIELD, TEACHER_ROLE),
            TenantScope::School => Filter::all(),
        };
        match &self.id_prefix {
            Some(prefix) => filter.with_id_prefix(prefix.clone()),
            None => filter,
        }
    }

    fn tenant_collection(&self) -> Collection {
        match self.scope {
            TenantScope::Teacher => Collection::Users,
            TenantScope::School => Collection::Schools,
        }
    }

    fn to_tenant(&self, stored: StoredDocument) -> Result<Tenant, QuotaError> {
        let id = TenantId::new(stored.id.clone())?;
        let name = display_name(&stored.body).unwrap_or_else(|| stored.id.clone());
        let school_id = match self.scope {
            TenantScope::Teacher => string_field(&stored.body, SCHOOL_FIELD),
            TenantScope::School => Some(stored.id),
        };
        Ok(Tenant::new(id, name, school_id))
    }
}

fn string_field(document: &Document, field: &str) -> Option<String> {
    match document.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn display_name(document: &Document) -> Option<String> {
    string_field(document, "displayName").or_else(|| string_field(document, "name"))
}

fn to_count(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[async_trait]
impl TenantDirectory for StoreTenantDirectory {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, QuotaError> {
        let documents = self
            .store
            .list_where(self.tenant_collection(), &self.tenant_filter())
            .await?;
        documents
            .into_iter()
            .map(|stored| self.to_tenant(stored))
            .collect()
    }

    async fn count_subjects(&self, tenant: &Tenant) -> Result<u32, QuotaError> {
        let filter = Filter::all().eq(self.scope.subject_owner_field(), tenant.id.as_str());
        let count = self.store.count_where(self.subjects, &filter).await?;
        Ok(to_count(count))
    }

    async fn count_active_students(&self, tenant: &Tenant) -> Result<u32, QuotaError> {
        let Some(school_id) = &tenant.school_id else {
            return Ok(0);
        };
        let filter = Filter::all()
            .eq(ROLE_FIELD, STUDENT_ROLE)
            .eq(SCHOOL_FIELD, school_id.as_str())
            .eq(ACTIVE_FIELD, true);
        let count = self.store.count_where(Collection::Users, &filter).await?;
        Ok(to_count(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::domain::migration::UsageCounts;
    use crate::ports::WriteMode;
    use serde_json::json;

    async fn put(store: &InMemoryDocumentStore, collection: Collection, id: &str, body: Value) {
        let Value::Object(map) = body else {
            panic!("expected object")
        };
        store.put(collection, id, map, WriteMode::Replace).await.unwrap();
    }

    async fn populated() -> Arc<InMemoryDocumentStore> {
        let store = Arc::new(InMemoryDocumentStore::new());
        put(&store, Collection::Schools, "s1", json!({"name": "Hill School"})).await;
        put(&store, Collection::Users, "t1", json!({"role": "teacher", "displayName": "Ada", "schoolId": "s1"})).await;
        put(&store, Collection::Users, "t2", json!({"role": "teacher", "name": "Bola"})).await;
        put(&store, Collection::Users, "st1", json!({"role": "student", "schoolId": "s1", "isActive": true})).await;
        put(&store, Collection::Users, "st2", json!({"role": "student", "schoolId": "s1", "isActive": true})).await;
        put(&store, Collection::Users, "st3", json!({"role": "student", "schoolId": "s1", "isActive": false})).await;
        put(&store, Collection::Subjects, "m1", json!({"teacherId": "t1", "schoolId": "s1"})).await;
        put(&store, Collection::Subjects, "m2", json!({"teacherId": "t1", "schoolId": "s1"})).await;
        put(&store, Collection::Exams, "e1", json!({"teacherId": "t2"})).await;
        store
    }

    #[tokio::test]
    async fn teacher_scope_lists_teachers_with_names() {
        let store = populated().await;
        let dir = StoreTenantDirectory::new(store, TenantScope::Teacher, SubjectSource::Subjects);

        let tenants = dir.list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].name, "Ada");
        assert_eq!(tenants[0].school_id.as_deref(), Some("s1"));
        assert_eq!(tenants[1].name, "Bola");
        assert!(tenants[1].school_id.is_none());
    }

    #[tokio::test]
    async fn teacher_ground_truth_counts_active_students_only() {
        let store = populated().await;
        let dir = StoreTenantDirectory::new(store, TenantScope::Teacher, SubjectSource::Subjects);
        let tenants = dir.list_tenants().await.unwrap();

        assert_eq!(dir.ground_truth(&tenants[0]).await.unwrap(), UsageCounts::new(2, 2));
        // No school, no students.
        assert_eq!(dir.ground_truth(&tenants[1]).await.unwrap(), UsageCounts::new(0, 0));
    }

    #[tokio::test]
    async fn exam_source_counts_exams() {
        let store = populated().await;
        let dir = StoreTenantDirectory::new(store, TenantScope::Teacher, SubjectSource::Exams);
        let tenants = dir.list_tenants().await.unwrap();
        assert_eq!(dir.count_subjects(&tenants[1]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn school_scope_uses_school_as_tenant() {
        let store = populated().await;
        let dir = StoreTenantDirectory::new(store, TenantScope::School, SubjectSource::Subjects);

        let tenants = dir.list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].name, "Hill School");
        assert_eq!(dir.ground_truth(&tenants[0]).await.unwrap(), UsageCounts::new(2, 2));
    }

    #[tokio::test]
    async fn id_prefix_restricts_listing() {
        let store = populated().await;
        let dir = StoreTenantDirectory::new(store, TenantScope::Teacher, SubjectSource::Subjects)
            .with_id_prefix("t2");
        let tenants = dir.list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].id.as_str(), "t2");
    }
}
