//! Subscription repository port.
//!
//! Typed persistence for `Subscription` aggregates, one per tenant.
//!
//! # Design
//!
//! - **Insert-if-absent**: `create` never overwrites, so racing backfills
//!   cannot produce a second subscription
//! - **Ledger-blind updates**: `update_lifecycle` writes every field except
//!   the usage counters, which belong to the limit gate
//! - **Per-record listing**: `list_all` reports a document that does not
//!   decode alongside the readable ones instead of failing the whole list

use async_trait::async_trait;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::{QuotaError, Subscription};

use super::CreateOutcome;

/// A stored subscription document that does not decode into a
/// `Subscription`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableSubscription {
    pub document_id: String,
    pub error: String,
}

/// One entry of `list_all`.
pub type ListedSubscription = Result<Subscription, UnreadableSubscription>;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription for a tenant.
    ///
    /// Returns `None` if the tenant has none.
    async fn find(&self, tenant_id: &TenantId) -> Result<Option<Subscription>, QuotaError>;

    /// Store a new subscription, including its seeded ledger.
    ///
    /// Returns `AlreadyExists` without writing if the tenant already has one.
    async fn create(&self, subscription: &Subscription) -> Result<CreateOutcome, QuotaError>;

    /// Persist lifecycle fields (tier, status, limits, dates, payment).
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if nothing exists for the tenant
    /// - `StoreUnavailable` on persistence failure
    async fn update_lifecycle(&self, subscription: &Subscription) -> Result<(), QuotaError>;

    /// Every stored subscription, ordered by tenant id.
    ///
    /// Only a failure to list at all is an `Err`; undecodable documents
    /// come back as `UnreadableSubscription` entries.
    async fn list_all(&self) -> Result<Vec<ListedSubscription>, QuotaError>;
}
