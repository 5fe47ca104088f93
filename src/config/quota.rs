//! Quota engine configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::migration::{SubjectSource, TenantScope};

/// What the status sweep does when a grace period runs out.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Flip status to expired and keep the unpaid tier's limits.
    #[default]
    RetainTier,
    /// Flip status to expired, then downgrade to the free tier.
    DowngradeToFree,
}

/// Quota engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Whether a tenant is an individual teacher or a whole school
    #[serde(default)]
    pub tenant_scope: TenantScope,

    /// Collection that holds the countable subject records
    #[serde(default)]
    pub subject_source: SubjectSource,

    /// Length of the grace period after a failed or missing renewal
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: u32,

    /// Behaviour once the grace period has elapsed
    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,
}

impl QuotaConfig {
    /// Validate quota configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.grace_period_days == 0 || self.grace_period_days > 30 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        Ok(())
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            tenant_scope: TenantScope::default(),
            subject_source: SubjectSource::default(),
            grace_period_days: default_grace_period_days(),
            expiry_policy: ExpiryPolicy::default(),
        }
    }
}

fn default_grace_period_days() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_config_defaults() {
        let config = QuotaConfig::default();
        assert_eq!(config.tenant_scope, TenantScope::Teacher);
        assert_eq!(config.subject_source, SubjectSource::Subjects);
        assert_eq!(config.grace_period_days, 3);
        assert_eq!(config.expiry_policy, ExpiryPolicy::RetainTier);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_grace_period_rejected() {
        let config = QuotaConfig {
            grace_period_days: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidGracePeriod)
        ));
    }

    #[test]
    fn test_quota_config_deserialization() {
        let json = r#"{
            "tenant_scope": "school",
            "subject_source": "exams",
            "grace_period_days": 5,
            "expiry_policy": "downgrade_to_free"
        }"#;

        let config: QuotaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tenant_scope, TenantScope::School);
        assert_eq!(config.subject_source, SubjectSource::Exams);
        assert_eq!(config.grace_period_days, 5);
        assert_eq!(config.expiry_policy, ExpiryPolicy::DowngradeToFree);
    }
}
