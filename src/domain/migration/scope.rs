//! Tenant scope and ground-truth vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::TenantId;
use crate::domain::subscription::{ResourceKind, UsageLedger};

/// Which entity owns a subscription in this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantScope {
    /// Tenants are users with `role = teacher`; subjects hang off
    /// `teacherId`, students off the teacher's `schoolId`.
    #[default]
    Teacher,
    /// Tenants are schools; subjects and students hang off `schoolId`.
    School,
}

impl TenantScope {
    /// Field on a subject record that names its owner.
    pub fn subject_owner_field(&self) -> &'static str {
        match self {
            TenantScope::Teacher => "teacherId",
            TenantScope::School => "schoolId",
        }
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantScope::Teacher => write!(f, "teacher"),
            TenantScope::School => write!(f, "school"),
        }
    }
}

/// Collection that holds the records counted against the subject limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectSource {
    #[default]
    Subjects,
    Exams,
}

impl SubjectSource {
    pub fn collection_name(&self) -> &'static str {
        match self {
            SubjectSource::Subjects => "subjects",
            SubjectSource::Exams => "exams",
        }
    }
}

/// A tenant as listed by the tenant directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// School the tenant's students belong to. For school-scoped tenants
    /// this is the tenant's own id. Teachers without one have no students.
    pub school_id: Option<String>,
}

impl Tenant {
    pub fn new(id: TenantId, name: impl Into<String>, school_id: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            school_id,
        }
    }
}

/// Subject and student counts, either recomputed from ground truth or
/// read back from a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageCounts {
    pub subjects: u32,
    pub students: u32,
}

impl UsageCounts {
    pub fn new(subjects: u32, students: u32) -> Self {
        Self { subjects, students }
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Subject => self.subjects,
            ResourceKind::Student => self.students,
        }
    }

    /// Ledger seeded with these counts.
    pub fn to_ledger(self) -> UsageLedger {
        UsageLedger::new(self.subjects, self.students)
    }
}

impl From<&UsageLedger> for UsageCounts {
    fn from(ledger: &UsageLedger) -> Self {
        Self::new(ledger.subjects(), ledger.students())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_picks_owner_field() {
        assert_eq!(TenantScope::Teacher.subject_owner_field(), "teacherId");
        assert_eq!(TenantScope::School.subject_owner_field(), "schoolId");
    }

    #[test]
    fn subject_source_names_collection() {
        assert_eq!(SubjectSource::default().collection_name(), "subjects");
        assert_eq!(SubjectSource::Exams.collection_name(), "exams");
    }

    #[test]
    fn counts_round_through_ledger() {
        let counts = UsageCounts::new(4, 12);
        let ledger = counts.to_ledger();
        assert_eq!(UsageCounts::from(&ledger), counts);
        assert_eq!(counts.get(ResourceKind::Student), 12);
    }
}
