//! Quota engine error types.
//!
//! Every operation of the limit gate, the subscription lifecycle and the
//! migration jobs reports failures through `QuotaError`.
//!
//! # Caller Mapping
//!
//! | Error | Meaning for callers |
//! |-------|---------------------|
//! | LimitExceeded | show upgrade prompt |
//! | QuestionLimitReached | block adding to the draft |
//! | SubscriptionNotFound | tenant was never backfilled |
//! | SubscriptionExists | create is idempotent, treat as done |
//! | UnknownPlanTier | bad input |
//! | InvalidState | lifecycle misuse |
//! | PaymentRequired | collect payment details first |
//! | RegistrationFailed | resource rolled back |
//! | ValidationFailed | bad input |
//! | StoreUnavailable | retry later |

use crate::domain::foundation::{DomainError, ErrorCode, TenantId, ValidationError};
use crate::domain::plan::PlanTier;

use super::ResourceKind;

/// Quota engine errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    /// Adding one more unit would exceed the tenant's limit.
    LimitExceeded {
        tenant_id: TenantId,
        resource: ResourceKind,
        current: u32,
        limit: u32,
    },

    /// An exam draft already holds the maximum number of questions.
    QuestionLimitReached { limit: u32 },

    /// No subscription document exists for the tenant.
    SubscriptionNotFound(TenantId),

    /// A subscription already exists for the tenant.
    SubscriptionExists(TenantId),

    /// Tier name is not in the plan catalog.
    UnknownPlanTier(String),

    /// Lifecycle operation not allowed in the current status.
    InvalidState { current: String, attempted: String },

    /// Paid tier requested without payment details.
    PaymentRequired { tier: PlanTier },

    /// Creating the resource itself failed after a slot was reserved.
    RegistrationFailed { reason: String },

    ValidationFailed { field: String, message: String },

    /// Document store failed or timed out.
    StoreUnavailable(String),
}

impl QuotaError {
    pub fn limit_exceeded(
        tenant_id: TenantId,
        resource: ResourceKind,
        current: u32,
        limit: u32,
    ) -> Self {
        QuotaError::LimitExceeded {
            tenant_id,
            resource,
            current,
            limit,
        }
    }

    pub fn question_limit_reached(limit: u32) -> Self {
        QuotaError::QuestionLimitReached { limit }
    }

    pub fn subscription_not_found(tenant_id: TenantId) -> Self {
        QuotaError::SubscriptionNotFound(tenant_id)
    }

    pub fn subscription_exists(tenant_id: TenantId) -> Self {
        QuotaError::SubscriptionExists(tenant_id)
    }

    pub fn unknown_plan_tier(tier: impl Into<String>) -> Self {
        QuotaError::UnknownPlanTier(tier.into())
    }

    pub fn payment_required(tier: PlanTier) -> Self {
        QuotaError::PaymentRequired { tier }
    }

    pub fn registration_failed(reason: impl Into<String>) -> Self {
        QuotaError::RegistrationFailed {
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QuotaError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        QuotaError::StoreUnavailable(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            QuotaError::LimitExceeded { .. } | QuotaError::QuestionLimitReached { .. } => {
                ErrorCode::LimitExceeded
            }
            QuotaError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            QuotaError::SubscriptionExists(_) => ErrorCode::SubscriptionExists,
            QuotaError::UnknownPlanTier(_) => ErrorCode::UnknownPlanTier,
            QuotaError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            QuotaError::PaymentRequired { .. } => ErrorCode::PaymentRequired,
            QuotaError::RegistrationFailed { .. } => ErrorCode::RegistrationFailed,
            QuotaError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            QuotaError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            QuotaError::LimitExceeded {
                tenant_id,
                resource,
                current,
                limit,
            } => format!(
                "Tenant {} has reached the {} limit ({}/{}). Upgrade your plan to add more.",
                tenant_id, resource, current, limit
            ),
            QuotaError::QuestionLimitReached { limit } => {
                format!("An exam can hold at most {} questions on this plan", limit)
            }
            QuotaError::SubscriptionNotFound(tenant_id) => {
                format!("No subscription found for tenant: {}", tenant_id)
            }
            QuotaError::SubscriptionExists(tenant_id) => {
                format!("Tenant {} already has a subscription", tenant_id)
            }
            QuotaError::UnknownPlanTier(tier) => format!("Unknown plan tier: {}", tier),
            QuotaError::InvalidState { current, attempted } => {
                format!("Cannot {} subscription in {} state", attempted, current)
            }
            QuotaError::PaymentRequired { tier } => {
                format!("Plan {} requires payment details", tier)
            }
            QuotaError::RegistrationFailed { reason } => {
                format!("Resource registration failed: {}", reason)
            }
            QuotaError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            QuotaError::StoreUnavailable(msg) => format!("Store unavailable: {}", msg),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuotaError::StoreUnavailable(_))
    }
}

impl std::fmt::Display for QuotaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for QuotaError {}

impl From<DomainError> for QuotaError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => QuotaError::InvalidState {
                current: err.detail("status").unwrap_or("unknown").to_string(),
                attempted: err.message,
            },
            ErrorCode::PaymentRequired => match err.detail("tier").map(str::parse::<PlanTier>) {
                Some(Ok(tier)) => QuotaError::PaymentRequired { tier },
                _ => QuotaError::ValidationFailed {
                    field: "payment".to_string(),
                    message: err.message,
                },
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::InvalidFormat => QuotaError::ValidationFailed {
                field: err.detail("field").unwrap_or("unknown").to_string(),
                message: err.message,
            },
            _ => QuotaError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<ValidationError> for QuotaError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        QuotaError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<QuotaError> for DomainError {
    fn from(err: QuotaError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::new("teacher-42").unwrap()
    }

    #[test]
    fn limit_exceeded_carries_counts() {
        let err = QuotaError::limit_exceeded(tenant(), ResourceKind::Subject, 3, 3);
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
        let msg = err.message();
        assert!(msg.contains("teacher-42"));
        assert!(msg.contains("subject"));
        assert!(msg.contains("3/3"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn question_limit_shares_limit_code() {
        let err = QuotaError::question_limit_reached(20);
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
        assert!(err.message().contains("20"));
    }

    #[test]
    fn not_found_and_exists_codes() {
        assert_eq!(
            QuotaError::subscription_not_found(tenant()).code(),
            ErrorCode::SubscriptionNotFound
        );
        assert_eq!(
            QuotaError::subscription_exists(tenant()).code(),
            ErrorCode::SubscriptionExists
        );
    }

    #[test]
    fn payment_required_names_tier() {
        let err = QuotaError::payment_required(PlanTier::Vip);
        assert_eq!(err.code(), ErrorCode::PaymentRequired);
        assert!(err.message().contains("vip"));
    }

    #[test]
    fn only_store_failures_are_retryable() {
        assert!(QuotaError::store_unavailable("timeout").is_retryable());
        assert!(!QuotaError::payment_required(PlanTier::Premium).is_retryable());
        assert!(!QuotaError::registration_failed("insert failed").is_retryable());
    }

    #[test]
    fn display_matches_message() {
        let err = QuotaError::unknown_plan_tier("gold");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn transition_domain_error_becomes_invalid_state() {
        let domain = DomainError::new(ErrorCode::InvalidStateTransition, "Cannot expire")
            .with_detail("status", "active");
        let err: QuotaError = domain.into();
        assert!(matches!(
            err,
            QuotaError::InvalidState { ref current, .. } if current == "active"
        ));
    }

    #[test]
    fn validation_domain_error_keeps_field() {
        let domain = DomainError::validation("plan_tier", "Use new_free for the free tier");
        let err: QuotaError = domain.into();
        assert!(matches!(
            err,
            QuotaError::ValidationFailed { ref field, .. } if field == "plan_tier"
        ));
    }

    #[test]
    fn validation_error_converts_with_field() {
        let err: QuotaError = ValidationError::empty_field("tenant_id").into();
        assert!(matches!(
            err,
            QuotaError::ValidationFailed { ref field, .. } if field == "tenant_id"
        ));
    }

    #[test]
    fn payment_required_domain_error_keeps_tier() {
        let domain = DomainError::new(ErrorCode::PaymentRequired, "Tier vip requires payment details")
            .with_detail("tier", "vip");
        let err: QuotaError = domain.into();
        assert_eq!(err, QuotaError::payment_required(PlanTier::Vip));
    }

    #[test]
    fn converts_back_to_domain_error() {
        let domain: DomainError = QuotaError::registration_failed("insert failed").into();
        assert_eq!(domain.code, ErrorCode::RegistrationFailed);
        assert!(domain.message.contains("insert failed"));
    }
}
