//! Migration job configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tuning for the backfill and validation batch jobs
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    /// Number of tenants processed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Id prefix that marks synthetic harness records as disposable
    #[serde(default = "default_test_id_prefix")]
    pub test_id_prefix: String,
}

impl MigrationConfig {
    /// Validate migration configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.concurrency == 0 || self.concurrency > 64 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.test_id_prefix.is_empty() || !self.test_id_prefix.ends_with('_') {
            return Err(ValidationError::InvalidTestPrefix);
        }
        Ok(())
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            test_id_prefix: default_test_id_prefix(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}

fn default_test_id_prefix() -> String {
    "test_migration_".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_config_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.test_id_prefix, "test_migration_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = MigrationConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prefix_without_separator_rejected() {
        let config = MigrationConfig {
            test_id_prefix: "synthetic".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTestPrefix)
        ));
    }
}
