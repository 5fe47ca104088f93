//! GetUsageHandler - Query for current usage against plan limits.
//!
//! Feeds the upgrade prompt: what the tenant has, what the plan allows,
//! and how much room is left.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::plan::PlanTier;
use crate::domain::subscription::{QuotaError, ResourceKind, Subscription, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct GetUsageQuery {
    pub tenant_id: TenantId,
}

/// Usage of one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub current: u32,
    pub limit: u32,
    pub remaining: u32,
    pub at_limit: bool,
}

impl ResourceUsage {
    fn of(subscription: &Subscription, kind: ResourceKind) -> Self {
        let current = subscription.usage().current(kind);
        let limit = subscription.limit(kind);
        Self {
            current,
            limit,
            remaining: limit.saturating_sub(current),
            at_limit: current >= limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub tenant_id: TenantId,
    pub plan_tier: PlanTier,
    pub status: SubscriptionStatus,
    pub subjects: ResourceUsage,
    pub students: ResourceUsage,
    pub question_limit: u32,
    pub expiry_date: Option<Timestamp>,
}

impl UsageSummary {
    /// True when any resource is at or over its limit.
    pub fn needs_upgrade(&self) -> bool {
        self.subjects.at_limit || self.students.at_limit
    }
}

impl From<&Subscription> for UsageSummary {
    fn from(subscription: &Subscription) -> Self {
        Self {
            tenant_id: subscription.tenant_id.clone(),
            plan_tier: subscription.plan_tier,
            status: subscription.status,
            subjects: ResourceUsage::of(subscription, ResourceKind::Subject),
            students: ResourceUsage::of(subscription, ResourceKind::Student),
            question_limit: subscription.question_limit,
            expiry_date: subscription.expiry_date,
        }
    }
}

pub struct GetUsageHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl GetUsageHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetUsageQuery) -> Result<UsageSummary, QuotaError> {
        let subscription = self
            .repository
            .find(&query.tenant_id)
            .await?
            .ok_or_else(|| QuotaError::subscription_not_found(query.tenant_id.clone()))?;
        Ok(UsageSummary::from(&subscription))
    }
}
