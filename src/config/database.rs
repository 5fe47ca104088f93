//! Document store connection settings
//!
//! `request_timeout_secs` bounds every individual store call; pool
//! acquisition has its own timeout.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Connection pool and timeouts for the Postgres-backed document store.
///
/// Everything except `url` has a default, so a bare
/// `EXAM_QUOTA__DATABASE__URL` is enough to start a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Upper bound for a single store call.
    pub request_timeout_secs: u64,
    /// Apply the `documents` schema before running a job.
    pub run_migrations: bool,
}

const MAX_POOL: u32 = 100;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let is_postgres = ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(*scheme));

        if self.url.trim().is_empty() {
            Err(ValidationError::MissingRequired("DATABASE_URL"))
        } else if !is_postgres {
            Err(ValidationError::InvalidDatabaseUrl)
        } else if self.min_connections > self.max_connections {
            Err(ValidationError::InvalidPoolSize)
        } else if self.max_connections > MAX_POOL {
            Err(ValidationError::PoolSizeTooLarge)
        } else if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            Err(ValidationError::InvalidTimeout)
        } else {
            Ok(())
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: 2,
            max_connections: 20,
            acquire_timeout_secs: 30,
            request_timeout_secs: 10,
            run_migrations: false,
        }
    }
}
