//! Document-backed implementation of SubscriptionRepository.
//!
//! Subscriptions are stored in the `subscriptions` collection keyed by
//! tenant id, using the aggregate's camelCase serde form.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::{QuotaError, ResourceKind, Subscription};
use crate::ports::{
    Collection, CreateOutcome, Document, DocumentStore, Filter, ListedSubscription, StoreError,
    SubscriptionRepository, UnreadableSubscription, WriteMode,
};

/// SubscriptionRepository over any DocumentStore.
pub struct StoreSubscriptionRepository {
    store: Arc<dyn DocumentStore>,
}

impl StoreSubscriptionRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

pub(crate) fn to_document(subscription: &Subscription) -> Result<Document, StoreError> {
    match serde_json::to_value(subscription)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Serialization(
            "subscription did not serialize to an object".to_string(),
        )),
    }
}

pub(crate) fn from_document(document: Document) -> Result<Subscription, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Lifecycle fields only: the ledger counters are stripped so a merge
/// write cannot overwrite a concurrent increment.
fn lifecycle_document(subscription: &Subscription) -> Result<Document, StoreError> {
    let mut document = to_document(subscription)?;
    for kind in ResourceKind::ALL {
        document.remove(kind.ledger_field());
    }
    Ok(document)
}

#[async_trait]
impl SubscriptionRepository for StoreSubscriptionRepository {
    async fn find(&self, tenant_id: &TenantId) -> Result<Option<Subscription>, QuotaError> {
        let document = self
            .store
            .get(Collection::Subscriptions, tenant_id.as_str())
            .await?;
        Ok(document.map(from_document).transpose()?)
    }

    async fn create(&self, subscription: &Subscription) -> Result<CreateOutcome, QuotaError> {
        let document = to_document(subscription)?;
        Ok(self
            .store
            .create(
                Collection::Subscriptions,
                subscription.tenant_id.as_str(),
                document,
            )
            .await?)
    }

    async fn update_lifecycle(&self, subscription: &Subscription) -> Result<(), QuotaError> {
        let id = subscription.tenant_id.as_str();
        if self.store.get(Collection::Subscriptions, id).await?.is_none() {
            return Err(QuotaError::subscription_not_found(
                subscription.tenant_id.clone(),
            ));
        }

        let document = lifecycle_document(subscription)?;
        self.store
            .put(Collection::Subscriptions, id, document, WriteMode::Merge)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ListedSubscription>, QuotaError> {
        let documents = self
            .store
            .list_where(Collection::Subscriptions, &Filter::all())
            .await?;
        Ok(documents
            .into_iter()
            .map(|stored| {
                from_document(stored.body).map_err(|err| UnreadableSubscription {
                    document_id: stored.id,
                    error: err.to_string(),
                })
            })
            .collect())
    }
}
