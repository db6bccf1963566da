//! Assignments: who currently owns an issue at each routing step
//!
//! Multiple assignments per issue form the routing history; at most one is
//! active per (issue, assignment_type) pair. The router completes the prior
//! active row of a type before creating the next one.

use crate::{ActorId, DepartmentId, IssueId, IssueStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an assignment
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

impl AssignmentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which routing hop an assignment records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    AdminToArea,
    AreaToDepartment,
    DepartmentToContractor,
}

impl AssignmentType {
    /// The assignment type materialized when an issue enters `stage`, if
    /// that stage is a routed one.
    pub fn for_stage(stage: IssueStage) -> Option<Self> {
        match stage {
            IssueStage::AreaReview => Some(Self::AdminToArea),
            IssueStage::DepartmentAssigned => Some(Self::AreaToDepartment),
            IssueStage::ContractorAssigned => Some(Self::DepartmentToContractor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminToArea => "admin_to_area",
            Self::AreaToDepartment => "area_to_department",
            Self::DepartmentToContractor => "department_to_contractor",
        }
    }
}

impl std::fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assignment lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ownership record for one routing hop of one issue
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier
    pub id: AssignmentId,
    /// The routed issue
    pub issue_id: IssueId,
    /// Who performed the routing
    pub assigned_by: ActorId,
    /// Who now owns the issue
    pub assigned_to: ActorId,
    /// Department involved in this hop, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_department_id: Option<DepartmentId>,
    /// Which hop this records
    pub assignment_type: AssignmentType,
    /// Lifecycle status
    pub status: AssignmentStatus,
    /// When the assignment was created
    pub created_at: DateTime<Utc>,
    /// When the assignment was last written
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(
        id: AssignmentId,
        issue_id: IssueId,
        assigned_by: ActorId,
        assigned_to: ActorId,
        assigned_department_id: Option<DepartmentId>,
        assignment_type: AssignmentType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            issue_id,
            assigned_by,
            assigned_to,
            assigned_department_id,
            assignment_type,
            status: AssignmentStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = AssignmentStatus::Completed;
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = AssignmentStatus::Cancelled;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routed_stages() {
        assert_eq!(
            AssignmentType::for_stage(IssueStage::AreaReview),
            Some(AssignmentType::AdminToArea)
        );
        assert_eq!(
            AssignmentType::for_stage(IssueStage::DepartmentAssigned),
            Some(AssignmentType::AreaToDepartment)
        );
        assert_eq!(
            AssignmentType::for_stage(IssueStage::ContractorAssigned),
            Some(AssignmentType::DepartmentToContractor)
        );
        assert_eq!(AssignmentType::for_stage(IssueStage::Reported), None);
        assert_eq!(AssignmentType::for_stage(IssueStage::Resolved), None);
    }

    #[test]
    fn test_lifecycle() {
        let mut assignment = Assignment::new(
            AssignmentId::new("asg-1"),
            IssueId::new("issue-1"),
            ActorId::new("admin-1"),
            ActorId::new("area-1"),
            None,
            AssignmentType::AdminToArea,
            Utc::now(),
        );
        assert!(assignment.is_active());

        assignment.complete(Utc::now());
        assert_eq!(assignment.status, AssignmentStatus::Completed);
        assert!(!assignment.is_active());
    }
}
