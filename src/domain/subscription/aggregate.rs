//! Subscription aggregate entity.
//!
//! One subscription per tenant. It carries the tenant's plan tier, the
//! limits copied from the plan catalog when that tier was assigned, the
//! usage ledger, and the payment bookkeeping the lifecycle needs.
//!
//! # Design Decisions
//!
//! - **Denormalized limits**: catalog changes do not reach existing
//!   subscriptions until an explicit plan change
//! - **Money in minor units**: amounts are i64 kobo/cents
//! - **Retained usage**: no lifecycle transition touches the ledger, so a
//!   downgrade can leave usage above the new limits
//! - **Explicit clock**: every transition takes `now` from the caller

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine, TenantId, Timestamp};
use crate::domain::plan::{Currency, PlanDefinition, PlanTier};
use serde::{Deserialize, Serialize};

use super::{ResourceKind, SubscriptionStatus, UsageLedger};

/// Opaque references into the external payment processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorReference {
    pub customer_ref: Option<String>,
    pub subscription_ref: Option<String>,
}

impl ProcessorReference {
    /// True when the processor can be asked to charge a renewal.
    pub fn is_chargeable(&self) -> bool {
        self.subscription_ref.is_some() || self.customer_ref.is_some()
    }
}

/// Payment information supplied when assigning a paid tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub currency: Currency,
    pub processor: ProcessorReference,
}

/// Subscription aggregate.
///
/// # Invariants
///
/// - `tenant_id` is unique and immutable
/// - Status transitions follow `SubscriptionStatus` rules
/// - Free tier has no `expiry_date`
/// - `grace_period_end` is set only while in `GracePeriod`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub tenant_id: TenantId,
    pub plan_tier: PlanTier,
    pub status: SubscriptionStatus,

    pub subject_limit: u32,
    pub student_limit: u32,
    pub question_limit: u32,

    #[serde(flatten)]
    usage: UsageLedger,

    pub start_date: Timestamp,
    /// None for the free tier, which never expires.
    pub expiry_date: Option<Timestamp>,
    pub grace_period_end: Option<Timestamp>,
    pub last_payment_date: Option<Timestamp>,

    /// Amount charged per billing period, minor units.
    pub amount_minor: i64,
    pub currency: Currency,
    #[serde(flatten)]
    pub processor: ProcessorReference,

    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// New free subscription with an empty ledger.
    pub fn new_free(tenant_id: TenantId, now: Timestamp) -> Self {
        Self::seeded_free(tenant_id, UsageLedger::default(), now)
    }

    /// New free subscription whose ledger starts at the given counts.
    ///
    /// Used when backfilling tenants that already own data.
    pub fn seeded_free(tenant_id: TenantId, usage: UsageLedger, now: Timestamp) -> Self {
        let plan = PlanDefinition::for_tier(PlanTier::Free);
        Self {
            tenant_id,
            plan_tier: PlanTier::Free,
            status: SubscriptionStatus::Active,
            subject_limit: plan.subject_limit,
            student_limit: plan.student_limit,
            question_limit: plan.question_limit,
            usage,
            start_date: now,
            expiry_date: None,
            grace_period_end: None,
            last_payment_date: None,
            amount_minor: 0,
            currency: Currency::default(),
            processor: ProcessorReference::default(),
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// New subscription on a paid tier, paid through one calendar month.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `plan` is the free tier.
    pub fn new_paid(
        tenant_id: TenantId,
        plan: &PlanDefinition,
        payment: PaymentDetails,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        if !plan.tier.is_paid() {
            return Err(DomainError::validation(
                "plan_tier",
                "Use new_free for the free tier",
            ));
        }
        let mut subscription = Self::new_free(tenant_id, now);
        subscription.apply_paid_plan(plan, payment, now);
        Ok(subscription)
    }

    /// Read-only view of the usage ledger.
    pub fn usage(&self) -> &UsageLedger {
        &self.usage
    }

    /// Denormalized limit for a resource.
    pub fn limit(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Subject => self.subject_limit,
            ResourceKind::Student => self.student_limit,
        }
    }

    /// True while at least one more unit of `kind` fits under the limit.
    pub fn has_capacity(&self, kind: ResourceKind) -> bool {
        self.usage.current(kind) < self.limit(kind)
    }

    /// True when usage exceeds the limit, which only a downgrade produces.
    pub fn is_over_limit(&self, kind: ResourceKind) -> bool {
        self.usage.current(kind) > self.limit(kind)
    }

    /// Whether one more question may be added to a draft of `draft_len`.
    pub fn can_add_question(&self, draft_len: usize) -> bool {
        draft_len < self.question_limit as usize
    }

    /// Paid, active and at or past its expiry date.
    pub fn is_renewal_due(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active
            && self.plan_tier.is_paid()
            && self.expiry_date.map_or(false, |expiry| expiry <= now)
    }

    /// In grace period and the window has closed.
    pub fn is_grace_elapsed(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::GracePeriod
            && self.grace_period_end.map_or(false, |end| end <= now)
    }

    /// Record a successful renewal charge.
    ///
    /// Advances the expiry date by exactly one calendar month.
    ///
    /// # Errors
    ///
    /// Returns error if the current status does not allow renewal.
    pub fn renew(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        let base = self.expiry_date.unwrap_or(now);
        self.expiry_date = Some(base.add_calendar_months(1));
        self.grace_period_end = None;
        self.last_payment_date = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Enter the grace period after a failed or impossible renewal.
    ///
    /// # Errors
    ///
    /// Returns error if the current status does not allow it.
    pub fn enter_grace_period(&mut self, now: Timestamp, grace_days: u32) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::GracePeriod)?;
        self.grace_period_end = Some(now.add_days(i64::from(grace_days)));
        self.updated_at = now;
        Ok(())
    }

    /// Mark the subscription expired once the grace period has elapsed.
    ///
    /// Tier and limits are left untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the current status does not allow expiry.
    pub fn expire(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Expired)?;
        self.updated_at = now;
        Ok(())
    }

    /// Drop to the free tier.
    ///
    /// Limits reset to the free plan and payment fields are cleared. The
    /// usage ledger is kept as-is even when it now exceeds the limits.
    ///
    /// # Errors
    ///
    /// Returns error if the current status cannot become active.
    pub fn downgrade_to_free(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        let plan = PlanDefinition::for_tier(PlanTier::Free);
        self.plan_tier = PlanTier::Free;
        self.apply_limits(plan);
        self.amount_minor = 0;
        self.expiry_date = None;
        self.grace_period_end = None;
        self.last_payment_date = None;
        self.processor = ProcessorReference::default();
        self.cancelled_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `plan`, upgrading or downgrading.
    ///
    /// A paid target requires payment details and starts a fresh billing
    /// month from `now`.
    ///
    /// # Errors
    ///
    /// - Validation error if a paid tier is requested without payment
    /// - Transition error if the current status cannot become active
    pub fn change_plan(
        &mut self,
        plan: &PlanDefinition,
        payment: Option<PaymentDetails>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if !plan.tier.is_paid() {
            return self.downgrade_to_free(now);
        }
        let payment = payment.ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentRequired,
                format!("Tier {} requires payment details", plan.tier),
            )
            .with_detail("tier", plan.tier.as_str())
        })?;
        self.transition_to(SubscriptionStatus::Active)?;
        self.apply_paid_plan(plan, payment, now);
        Ok(())
    }

    /// Cancel the subscription.
    ///
    /// # Errors
    ///
    /// Returns error if the current status cannot be cancelled.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Cancelled)?;
        self.grace_period_end = None;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn apply_paid_plan(&mut self, plan: &PlanDefinition, payment: PaymentDetails, now: Timestamp) {
        self.plan_tier = plan.tier;
        self.apply_limits(plan);
        self.amount_minor = plan.price_for(payment.currency);
        self.currency = payment.currency;
        self.processor = payment.processor;
        self.expiry_date = Some(now.add_calendar_months(1));
        self.grace_period_end = None;
        self.last_payment_date = Some(now);
        self.cancelled_at = None;
        self.updated_at = now;
    }

    fn apply_limits(&mut self, plan: &PlanDefinition) {
        self.subject_limit = plan.subject_limit;
        self.student_limit = plan.student_limit;
        self.question_limit = plan.question_limit;
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {:?} to {:?}",
                    self.status, target
                ),
            )
            .with_detail("tenant_id", self.tenant_id.as_str())
            .with_detail("status", self.status.as_str())
        })?;
        Ok(())
    }
}
