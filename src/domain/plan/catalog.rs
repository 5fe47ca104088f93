//! Plan catalog: limits and prices per tier.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::PlanTier;
use crate::domain::subscription::QuotaError;

/// Billing currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ngn,
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Ngn => write!(f, "NGN"),
            Currency::Usd => write!(f, "USD"),
        }
    }
}

/// Monthly price in minor units (kobo, cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrice {
    pub ngn: i64,
    pub usd: i64,
}

/// Immutable definition of a plan tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDefinition {
    pub tier: PlanTier,
    /// Maximum subjects (or exams) a tenant may hold.
    pub subject_limit: u32,
    /// Maximum active students a tenant may hold.
    pub student_limit: u32,
    /// Maximum questions in a single exam draft.
    pub question_limit: u32,
    pub price_minor: PlanPrice,
    pub features: Vec<String>,
}

/// | Tier | Subjects | Students | Questions/exam | NGN | USD |
/// |------|----------|----------|----------------|-----|-----|
/// | Free | 3 | 10 | 20 | 0 | 0 |
/// | Premium | 10 | 100 | 50 | 5,000.00 | 5.00 |
/// | Vip | 50 | 500 | 100 | 15,000.00 | 15.00 |
static CATALOG: Lazy<[PlanDefinition; 3]> = Lazy::new(|| {
    [
        PlanDefinition {
            tier: PlanTier::Free,
            subject_limit: 3,
            student_limit: 10,
            question_limit: 20,
            price_minor: PlanPrice { ngn: 0, usd: 0 },
            features: features(&["basic_exams", "manual_grading"]),
        },
        PlanDefinition {
            tier: PlanTier::Premium,
            subject_limit: 10,
            student_limit: 100,
            question_limit: 50,
            price_minor: PlanPrice {
                ngn: 500_000,
                usd: 500,
            },
            features: features(&[
                "basic_exams",
                "manual_grading",
                "auto_grading",
                "result_export",
            ]),
        },
        PlanDefinition {
            tier: PlanTier::Vip,
            subject_limit: 50,
            student_limit: 500,
            question_limit: 100,
            price_minor: PlanPrice {
                ngn: 1_500_000,
                usd: 1_500,
            },
            features: features(&[
                "basic_exams",
                "manual_grading",
                "auto_grading",
                "result_export",
                "analytics",
                "priority_support",
            ]),
        },
    ]
});

fn features(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl PlanDefinition {
    /// Typed lookup; every tier has a definition.
    pub fn for_tier(tier: PlanTier) -> &'static PlanDefinition {
        match tier {
            PlanTier::Free => &CATALOG[0],
            PlanTier::Premium => &CATALOG[1],
            PlanTier::Vip => &CATALOG[2],
        }
    }

    /// Monthly price in the given currency, minor units.
    pub fn price_for(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Ngn => self.price_minor.ngn,
            Currency::Usd => self.price_minor.usd,
        }
    }
}

/// Look up a plan by its tier name.
///
/// # Errors
///
/// `QuotaError::UnknownPlanTier` if the name is not free, premium or vip.
pub fn get_plan(tier: &str) -> Result<&'static PlanDefinition, QuotaError> {
    let tier: PlanTier = tier
        .parse()
        .map_err(|_| QuotaError::unknown_plan_tier(tier))?;
    Ok(PlanDefinition::for_tier(tier))
}
