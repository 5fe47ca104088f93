//! Error vocabulary shared by every domain module.
//!
//! `ValidationError` covers value-object construction; `DomainError` is the
//! coded error aggregates return, converted to `QuotaError` at the edges.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Rejected input while building a value object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    EmptyField { field: String },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField { field: field.into() }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Stable machine-readable codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    EmptyField,
    InvalidFormat,

    SubscriptionNotFound,
    UnknownPlanTier,

    InvalidStateTransition,
    SubscriptionExists,

    LimitExceeded,
    PaymentRequired,
    RegistrationFailed,

    StoreUnavailable,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::EmptyField => "EMPTY_FIELD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::UnknownPlanTier => "UNKNOWN_PLAN_TIER",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::SubscriptionExists => "SUBSCRIPTION_EXISTS",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::RegistrationFailed => "REGISTRATION_FAILED",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coded error with keyed context (`field`, `status`, `tenant_id`).
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// `ValidationFailed` tagged with the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}
