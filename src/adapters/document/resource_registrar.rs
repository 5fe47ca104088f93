//! Document-backed implementation of ResourceRegistrar.
//!
//! Subjects become documents in the configured subject collection owned by
//! the tenant. Students become `users` with `role = student` in the
//! tenant's school; unregistering a student deactivates it rather than
//! deleting it.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::foundation::TenantId;
use crate::domain::migration::{SubjectSource, TenantScope};
use crate::domain::subscription::ResourceKind;
use crate::ports::{
    Collection, CreateOutcome, Document, DocumentStore, RegistrarError, ResourceRegistrar,
    StoreError, WriteMode,
};

use super::tenant_directory::{ACTIVE_FIELD, ROLE_FIELD, SCHOOL_FIELD, STUDENT_ROLE};

/// ResourceRegistrar over any DocumentStore.
pub struct StoreResourceRegistrar {
    store: Arc<dyn DocumentStore>,
    scope: TenantScope,
    subjects: Collection,
}

impl StoreResourceRegistrar {
    pub fn new(store: Arc<dyn DocumentStore>, scope: TenantScope, source: SubjectSource) -> Self {
        Self {
            store,
            scope,
            subjects: Collection::from(source),
        }
    }

    async fn school_of(&self, tenant_id: &TenantId) -> Result<String, RegistrarError> {
        if self.scope == TenantScope::School {
            return Ok(tenant_id.to_string());
        }
        let teacher = self
            .store
            .get(Collection::Users, tenant_id.as_str())
            .await
            .map_err(unavailable)?
            .ok_or_else(|| RegistrarError::NotFound(format!("teacher {}", tenant_id)))?;
        match teacher.get(SCHOOL_FIELD) {
            Some(Value::String(school)) if !school.is_empty() => Ok(school.clone()),
            _ => Err(RegistrarError::Rejected(format!(
                "teacher {} has no school",
                tenant_id
            ))),
        }
    }
}

fn unavailable(err: StoreError) -> RegistrarError {
    RegistrarError::Unavailable(err.to_string())
}

fn attributes_document(attributes: &Value) -> Result<Document, RegistrarError> {
    match attributes {
        Value::Null => Ok(Document::new()),
        Value::Object(map) => Ok(map.clone()),
        _ => Err(RegistrarError::Rejected(
            "attributes must be a JSON object".to_string(),
        )),
    }
}

#[async_trait]
impl ResourceRegistrar for StoreResourceRegistrar {
    async fn register(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
        attributes: &Value,
    ) -> Result<String, RegistrarError> {
        let mut document = attributes_document(attributes)?;
        let id = Uuid::new_v4().to_string();

        let collection = match kind {
            ResourceKind::Subject => {
                document.insert(
                    self.scope.subject_owner_field().to_string(),
                    Value::from(tenant_id.as_str()),
                );
                self.subjects
            }
            ResourceKind::Student => {
                let school = self.school_of(tenant_id).await?;
                document.insert(ROLE_FIELD.to_string(), Value::from(STUDENT_ROLE));
                document.insert(SCHOOL_FIELD.to_string(), Value::from(school));
                document.insert(ACTIVE_FIELD.to_string(), Value::Bool(true));
                Collection::Users
            }
        };

        match self
            .store
            .create(collection, &id, document)
            .await
            .map_err(unavailable)?
        {
            CreateOutcome::Created => Ok(id),
            CreateOutcome::AlreadyExists => Err(RegistrarError::Rejected(format!(
                "{} {} already exists",
                kind, id
            ))),
        }
    }

    async fn unregister(
        &self,
        tenant_id: &TenantId,
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<(), RegistrarError> {
        match kind {
            ResourceKind::Subject => {
                let owner = self
                    .store
                    .get(self.subjects, resource_id)
                    .await
                    .map_err(unavailable)?
                    .and_then(|doc| doc.get(self.scope.subject_owner_field()).cloned());
                if owner.as_ref().and_then(Value::as_str) != Some(tenant_id.as_str()) {
                    return Err(RegistrarError::NotFound(format!("subject {}", resource_id)));
                }
                self.store
                    .delete(self.subjects, resource_id)
                    .await
                    .map_err(unavailable)?;
            }
            ResourceKind::Student => {
                let school = self.school_of(tenant_id).await?;
                let student = self
                    .store
                    .get(Collection::Users, resource_id)
                    .await
                    .map_err(unavailable)?;
                let active_here = student.map_or(false, |doc| {
                    doc.get(SCHOOL_FIELD).and_then(Value::as_str) == Some(school.as_str())
                        && doc.get(ACTIVE_FIELD) == Some(&Value::Bool(true))
                });
                if !active_here {
                    return Err(RegistrarError::NotFound(format!("student {}", resource_id)));
                }
                let mut patch = Document::new();
                patch.insert(ACTIVE_FIELD.to_string(), Value::Bool(false));
                self.store
                    .put(Collection::Users, resource_id, patch, WriteMode::Merge)
                    .await
                    .map_err(unavailable)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::StoreTenantDirectory;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::domain::migration::Tenant;
    use crate::ports::TenantDirectory;
    use serde_json::json;

    async fn setup() -> (Arc<InMemoryDocumentStore>, StoreResourceRegistrar, StoreTenantDirectory) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let Value::Object(teacher) = json!({"role": "teacher", "schoolId": "s1"}) else {
            unreachable!()
        };
        store
            .put(Collection::Users, "t1", teacher, WriteMode::Replace)
            .await
            .unwrap();
        let registrar =
            StoreResourceRegistrar::new(store.clone(), TenantScope::Teacher, SubjectSource::Subjects);
        let directory =
            StoreTenantDirectory::new(store.clone(), TenantScope::Teacher, SubjectSource::Subjects);
        (store, registrar, directory)
    }

    fn teacher() -> Tenant {
        Tenant::new(TenantId::new("t1").unwrap(), "t1", Some("s1".to_string()))
    }

    #[tokio::test]
    async fn registered_resources_count_as_ground_truth() {
        let (_, registrar, directory) = setup().await;
        let tenant = TenantId::new("t1").unwrap();

        registrar
            .register(&tenant, ResourceKind::Subject, &json!({"name": "Maths"}))
            .await
            .unwrap();
        registrar
            .register(&tenant, ResourceKind::Student, &Value::Null)
            .await
            .unwrap();

        assert_eq!(directory.count_subjects(&teacher()).await.unwrap(), 1);
        assert_eq!(directory.count_active_students(&teacher()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unregistered_student_is_deactivated() {
        let (store, registrar, directory) = setup().await;
        let tenant = TenantId::new("t1").unwrap();
        let id = registrar
            .register(&tenant, ResourceKind::Student, &Value::Null)
            .await
            .unwrap();

        registrar
            .unregister(&tenant, ResourceKind::Student, &id)
            .await
            .unwrap();

        assert_eq!(directory.count_active_students(&teacher()).await.unwrap(), 0);
        assert!(store.get(Collection::Users, &id).await.unwrap().is_some());
        assert!(registrar
            .unregister(&tenant, ResourceKind::Student, &id)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn cannot_unregister_another_tenants_subject() {
        let (_, registrar, _) = setup().await;
        let owner = TenantId::new("t1").unwrap();
        let id = registrar
            .register(&owner, ResourceKind::Subject, &Value::Null)
            .await
            .unwrap();

        let other = TenantId::new("t9").unwrap();
        let err = registrar
            .unregister(&other, ResourceKind::Subject, &id)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_object_attributes_rejected() {
        let (_, registrar, _) = setup().await;
        let tenant = TenantId::new("t1").unwrap();
        let err = registrar
            .register(&tenant, ResourceKind::Subject, &json!(["x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::Rejected(_)));
    }
}
