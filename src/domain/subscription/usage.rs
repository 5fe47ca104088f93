//! Usage ledger: the live per-tenant consumption counters.
//!
//! The counters have no public setters. Once a subscription exists they
//! change only through the limit gate's atomic store operations, so there
//! is no path for application code to overwrite them with a stale value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A countable resource guarded by the limit gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Subject,
    Student,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Subject, ResourceKind::Student];

    /// Document field holding the running counter.
    pub fn ledger_field(&self) -> &'static str {
        match self {
            ResourceKind::Subject => "currentSubjects",
            ResourceKind::Student => "currentStudents",
        }
    }

    /// Document field holding the denormalized limit.
    pub fn limit_field(&self) -> &'static str {
        match self {
            ResourceKind::Subject => "subjectLimit",
            ResourceKind::Student => "studentLimit",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Subject => write!(f, "subject"),
            ResourceKind::Student => write!(f, "student"),
        }
    }
}

/// Running usage counters embedded in a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLedger {
    current_subjects: u32,
    current_students: u32,
}

impl UsageLedger {
    /// Ledger seeded from ground-truth counts.
    pub fn new(current_subjects: u32, current_students: u32) -> Self {
        Self {
            current_subjects,
            current_students,
        }
    }

    /// Current count for a resource.
    pub fn current(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Subject => self.current_subjects,
            ResourceKind::Student => self.current_students,
        }
    }

    pub fn subjects(&self) -> u32 {
        self.current_subjects
    }

    pub fn students(&self) -> u32 {
        self.current_students
    }
}
