//! Failures while reading or checking `AppConfig`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A value that parsed but is out of range.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequired(&'static str),

    #[error("request timeout must be 1..=300 seconds")]
    InvalidTimeout,

    #[error("database URL must use the postgres:// or postgresql:// scheme")]
    InvalidDatabaseUrl,

    #[error("min_connections is greater than max_connections")]
    InvalidPoolSize,

    #[error("max_connections may not exceed 100")]
    PoolSizeTooLarge,

    #[error("grace period must be 1..=30 days")]
    InvalidGracePeriod,

    #[error("migration concurrency must be 1..=64")]
    InvalidConcurrency,

    #[error("test id prefix must be non-empty and end with '_'")]
    InvalidTestPrefix,

    #[error("unparseable log filter: {0}")]
    InvalidLogFilter(String),
}
