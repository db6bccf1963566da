//! Issues: citizen reports moving through the resolution pipeline
//!
//! An issue carries two state columns: a coarse `status` and an ordered
//! `workflow_stage`. The stage is the state machine the validator checks;
//! the status is derived alongside certain stage transitions. The stage
//! never regresses except via admin override, which lives outside the core.

use crate::{ActorId, DepartmentId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for an issue
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueId(pub String);

impl IssueId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Status and stage ─────────────────────────────────────────────────

/// Coarse-grained issue status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Reported,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

/// Ordered checkpoint in the issue resolution pipeline.
///
/// Variant order is the pipeline order; the derived `Ord` is the
/// monotonicity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueStage {
    #[default]
    Reported,
    AreaReview,
    DepartmentAssigned,
    ContractorAssigned,
    InProgress,
    DepartmentReview,
    Resolved,
}

impl IssueStage {
    pub const ALL: [IssueStage; 7] = [
        Self::Reported,
        Self::AreaReview,
        Self::DepartmentAssigned,
        Self::ContractorAssigned,
        Self::InProgress,
        Self::DepartmentReview,
        Self::Resolved,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::AreaReview => "area_review",
            Self::DepartmentAssigned => "department_assigned",
            Self::ContractorAssigned => "contractor_assigned",
            Self::InProgress => "in_progress",
            Self::DepartmentReview => "department_review",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for IssueStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Issue ────────────────────────────────────────────────────────────

/// A citizen-reported civic issue
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier
    pub id: IssueId,
    /// Short summary
    pub title: String,
    /// Full description
    pub description: String,
    /// Who reported the issue
    pub reported_by: ActorId,
    /// Coarse status
    pub status: IssueStatus,
    /// Pipeline stage (the state machine)
    pub workflow_stage: IssueStage,
    /// Department the issue has been routed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_department_id: Option<DepartmentId>,
    /// Actor currently responsible for the issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_assignee_id: Option<ActorId>,
    /// Set exactly once, on entering `resolved`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Calendar date of resolution, set with `resolved_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_resolution_date: Option<NaiveDate>,
    /// When the issue was reported
    pub created_at: DateTime<Utc>,
    /// When the issue was last written
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed write
    pub version: u64,
}

impl Issue {
    /// Create a freshly reported issue
    pub fn new(
        id: IssueId,
        title: impl Into<String>,
        description: impl Into<String>,
        reported_by: ActorId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            reported_by,
            status: IssueStatus::Reported,
            workflow_stage: IssueStage::Reported,
            assigned_department_id: None,
            current_assignee_id: None,
            resolved_at: None,
            actual_resolution_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == IssueStatus::Resolved
    }

    /// Mark resolved. Resolution timestamps are written exactly once; a
    /// second call leaves them untouched.
    pub fn mark_resolved(&mut self, now: DateTime<Utc>, today: NaiveDate) {
        self.status = IssueStatus::Resolved;
        self.workflow_stage = IssueStage::Resolved;
        if self.resolved_at.is_none() {
            self.resolved_at = Some(now);
            self.actual_resolution_date = Some(today);
        }
    }

    /// Stamp a committed write
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_issue() -> Issue {
        Issue::new(
            IssueId::new("issue-1"),
            "Broken streetlight",
            "Light out on Elm & 4th",
            ActorId::new("citizen-1"),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_issue_defaults() {
        let issue = make_issue();
        assert_eq!(issue.status, IssueStatus::Reported);
        assert_eq!(issue.workflow_stage, IssueStage::Reported);
        assert!(issue.assigned_department_id.is_none());
        assert!(issue.resolved_at.is_none());
        assert_eq!(issue.version, 0);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(IssueStage::Reported < IssueStage::AreaReview);
        assert!(IssueStage::ContractorAssigned < IssueStage::InProgress);
        assert!(IssueStage::DepartmentReview < IssueStage::Resolved);

        // ALL is in pipeline order
        for pair in IssueStage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_mark_resolved_sets_timestamps_once() {
        let mut issue = make_issue();
        let now = Utc::now();
        let today = now.date_naive();

        issue.mark_resolved(now, today);
        let first = issue.resolved_at;
        assert!(first.is_some());
        assert_eq!(issue.actual_resolution_date, Some(today));

        let later = now + chrono::Duration::hours(1);
        issue.mark_resolved(later, later.date_naive());
        assert_eq!(issue.resolved_at, first);
    }

    #[test]
    fn test_touch_bumps_version() {
        let mut issue = make_issue();
        issue.touch(Utc::now());
        issue.touch(Utc::now());
        assert_eq!(issue.version, 2);
    }

    #[test]
    fn test_stage_wire_names() {
        let json = serde_json::to_string(&IssueStage::DepartmentReview).unwrap();
        assert_eq!(json, "\"department_review\"");
        assert!(serde_json::from_str::<IssueStage>("\"closed\"").is_err());
    }
}
