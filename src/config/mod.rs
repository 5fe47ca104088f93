//! Job configuration, read from `EXAM_QUOTA__*` environment variables.
//!
//! A `.env` file in the working directory is honoured for local runs.
//! Nested keys use a double underscore, so `quota.tenant_scope` is
//! `EXAM_QUOTA__QUOTA__TENANT_SCOPE`.

mod database;
mod error;
mod migration;
mod quota;
mod telemetry;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use migration::MigrationConfig;
pub use quota::{ExpiryPolicy, QuotaConfig};
pub use telemetry::{LogFormat, TelemetryConfig};

use serde::Deserialize;

/// Everything a backfill, validation or sweep run needs.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

const ENV_PREFIX: &str = "EXAM_QUOTA";

impl AppConfig {
    /// Reads the environment (after `.env`) into typed sections.
    ///
    /// Fails when `EXAM_QUOTA__DATABASE__URL` is absent or a value does not
    /// parse. Range checks are left to [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is the normal case outside development.
        let _ = dotenvy::dotenv();

        let source = config::Environment::with_prefix(ENV_PREFIX).separator("__");
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Range-checks every section, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.quota.validate()?;
        self.migration.validate()?;
        self.telemetry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::migration::{SubjectSource, TenantScope};
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 5] = [
        "EXAM_QUOTA__DATABASE__URL",
        "EXAM_QUOTA__QUOTA__TENANT_SCOPE",
        "EXAM_QUOTA__QUOTA__SUBJECT_SOURCE",
        "EXAM_QUOTA__QUOTA__EXPIRY_POLICY",
        "EXAM_QUOTA__MIGRATION__CONCURRENCY",
    ];

    /// Loads with exactly `vars` set among the keys above.
    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        for key in KEYS {
            env::remove_var(key);
        }
        result
    }

    const DB: (&str, &str) = ("EXAM_QUOTA__DATABASE__URL", "postgresql://quota@localhost/exams");

    #[test]
    fn database_url_alone_is_enough() {
        let config = load_with(&[DB]).unwrap();

        assert_eq!(config.database.url, "postgresql://quota@localhost/exams");
        assert!(config.validate().is_ok());
        assert_eq!(config.quota.tenant_scope, TenantScope::Teacher);
        assert_eq!(config.quota.grace_period_days, 3);
        assert_eq!(config.quota.expiry_policy, ExpiryPolicy::RetainTier);
    }

    #[test]
    fn school_deployment_reads_nested_keys() {
        let config = load_with(&[
            DB,
            ("EXAM_QUOTA__QUOTA__TENANT_SCOPE", "school"),
            ("EXAM_QUOTA__QUOTA__SUBJECT_SOURCE", "exams"),
            ("EXAM_QUOTA__QUOTA__EXPIRY_POLICY", "downgrade_to_free"),
            ("EXAM_QUOTA__MIGRATION__CONCURRENCY", "16"),
        ])
        .unwrap();

        assert_eq!(config.quota.tenant_scope, TenantScope::School);
        assert_eq!(config.quota.subject_source, SubjectSource::Exams);
        assert_eq!(config.quota.expiry_policy, ExpiryPolicy::DowngradeToFree);
        assert_eq!(config.migration.concurrency, 16);
    }

    #[test]
    fn unknown_scope_fails_to_load() {
        assert!(load_with(&[DB, ("EXAM_QUOTA__QUOTA__TENANT_SCOPE", "district")]).is_err());
    }

    #[test]
    fn missing_database_section_fails() {
        assert!(load_with(&[]).is_err());
    }
}
