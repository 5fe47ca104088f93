//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Key of the entity that owns a subscription and its usage ledger.
///
/// Opaque on purpose: depending on deployment a tenant is either an
/// individual teacher or a whole school, and nothing in the quota engine
/// interprets the value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new TenantId, returning error if empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("tenant_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier of one execution of a batch job (backfill, validation, sweep).
///
/// Attached to reports and log lines so operators can correlate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchRunId(Uuid);

impl BatchRunId {
    /// Creates a new random BatchRunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BatchRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_id_accepts_non_empty_string() {
        let id = TenantId::new("teacher-123").unwrap();
        assert_eq!(id.as_str(), "teacher-123");
    }

    #[test]
    fn tenant_id_rejects_blank_string() {
        match TenantId::new("   ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "tenant_id"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }

    #[test]
    fn tenant_id_parses_from_str() {
        let id: TenantId = "school-9".parse().unwrap();
        assert_eq!(format!("{}", id), "school-9");
    }

    #[test]
    fn tenant_id_serializes_transparently() {
        let id = TenantId::new("teacher1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"teacher1\"");
    }

    #[test]
    fn batch_run_ids_are_unique() {
        assert_ne!(BatchRunId::new(), BatchRunId::new());
    }
}
