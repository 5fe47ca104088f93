//! Plan tier definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription plan tier.
///
/// Determines subject, student and question limits and pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier - never expires, small limits.
    Free,

    /// Paid monthly tier for individual teachers and small schools.
    Premium,

    /// Paid monthly tier with the largest limits.
    Vip,
}

impl PlanTier {
    /// All tiers, lowest first.
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Premium, PlanTier::Vip];

    /// Returns true if this tier is billed.
    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }

    /// Returns the wire name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Premium => "premium",
            PlanTier::Vip => "vip",
        }
    }

    /// Returns the numeric rank of this tier for comparison.
    ///
    /// Higher rank = larger limits. Plan changes compare ranks to tell
    /// upgrades from downgrades.
    pub fn rank(&self) -> u8 {
        match self {
            PlanTier::Free => 0,
            PlanTier::Premium => 1,
            PlanTier::Vip => 2,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "premium" => Ok(PlanTier::Premium),
            "vip" => Ok(PlanTier::Vip),
            other => Err(ValidationError::invalid_format(
                "plan_tier",
                format!("'{}' is not one of free, premium, vip", other),
            )),
        }
    }
}
