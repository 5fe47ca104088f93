//! Subscription status state machine.
//!
//! Defines the subscription states and the transitions renewal, grace
//! expiry, plan changes and cancellation may perform.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid up, or on the free tier.
    Active,

    /// Renewal failed or no payment method on file.
    /// Remains nominally active until `grace_period_end`.
    GracePeriod,

    /// Grace period ran out without a successful renewal.
    Expired,

    /// Explicitly cancelled by the tenant or an administrator.
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns the wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::GracePeriod => "grace_period",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use SubscriptionStatus::*;
        match self {
            // Renewal and plan changes stay active.
            Active => &[Active, GracePeriod, Cancelled],
            GracePeriod => &[Active, Expired, Cancelled],
            // Re-subscribe or drop to free.
            Expired | Cancelled => &[Active],
        }
    }
}
