//! Tenders: procurement records spawned from issues
//!
//! A tender optionally points back at its source issue. Award fields
//! (contractor, amount, timestamp) are written together, exactly once, by
//! the bid-acceptance cascade; `completion_date` is written once by the
//! completion-approval cascade.

use crate::{ActorId, DepartmentId, IssueId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a tender
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenderId(pub String);

impl TenderId {
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

impl std::fmt::Display for TenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Status and stage ─────────────────────────────────────────────────

/// Coarse-grained tender status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    #[default]
    Open,
    Awarded,
    Completed,
}

/// Ordered checkpoint in the tendering pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenderStage {
    #[default]
    Created,
    Available,
    BiddingClosed,
    UnderReview,
    Awarded,
    WorkInProgress,
    WorkCompleted,
    Verified,
    Completed,
}

impl TenderStage {
    pub const ALL: [TenderStage; 9] = [
        Self::Created,
        Self::Available,
        Self::BiddingClosed,
        Self::UnderReview,
        Self::Awarded,
        Self::WorkInProgress,
        Self::WorkCompleted,
        Self::Verified,
        Self::Completed,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Available => "available",
            Self::BiddingClosed => "bidding_closed",
            Self::UnderReview => "under_review",
            Self::Awarded => "awarded",
            Self::WorkInProgress => "work_in_progress",
            Self::WorkCompleted => "work_completed",
            Self::Verified => "verified",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TenderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Tender ───────────────────────────────────────────────────────────

/// A procurement tender, optionally backed by a source issue
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tender {
    /// Unique identifier
    pub id: TenderId,
    /// Short summary
    pub title: String,
    /// Full description of the requested work
    pub description: String,
    /// The issue this tender was opened for; immutable after creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_issue_id: Option<IssueId>,
    /// Owning department
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    /// Coarse status
    pub status: TenderStatus,
    /// Pipeline stage (the state machine)
    pub workflow_stage: TenderStage,
    /// Winning contractor; written by the award cascade
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awarded_contractor_id: Option<ActorId>,
    /// Winning bid amount in minor currency units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awarded_amount: Option<i64>,
    /// When the award happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awarded_at: Option<DateTime<Utc>>,
    /// Set once, on verified completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    /// When the tender was created
    pub created_at: DateTime<Utc>,
    /// When the tender was last written
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed write
    pub version: u64,
}

impl Tender {
    /// Create a fresh tender
    pub fn new(
        id: TenderId,
        title: impl Into<String>,
        description: impl Into<String>,
        source_issue_id: Option<IssueId>,
        department_id: Option<DepartmentId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            source_issue_id,
            department_id,
            status: TenderStatus::Open,
            workflow_stage: TenderStage::Created,
            awarded_contractor_id: None,
            awarded_amount: None,
            awarded_at: None,
            completion_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_awarded(&self) -> bool {
        self.awarded_contractor_id.is_some()
    }

    /// Write the award fields together. A no-op if already awarded.
    pub fn award(&mut self, contractor: ActorId, amount: i64, now: DateTime<Utc>) {
        if self.is_awarded() {
            return;
        }
        self.awarded_contractor_id = Some(contractor);
        self.awarded_amount = Some(amount);
        self.awarded_at = Some(now);
        self.status = TenderStatus::Awarded;
        self.workflow_stage = TenderStage::Awarded;
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

    fn make_tender() -> Tender {
        Tender::new(
            TenderId::new("tender-1"),
            "Streetlight repair",
            "Replace fixture at Elm & 4th",
            Some(IssueId::new("issue-1")),
            Some(DepartmentId::new("dept-roads")),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_tender_defaults() {
        let tender = make_tender();
        assert_eq!(tender.status, TenderStatus::Open);
        assert_eq!(tender.workflow_stage, TenderStage::Created);
        assert!(!tender.is_awarded());
        assert!(tender.completion_date.is_none());
    }

    #[test]
    fn test_award_writes_fields_together() {
        let mut tender = make_tender();
        let now = Utc::now();
        tender.award(ActorId::new("contractor-1"), 125_000, now);

        assert_eq!(tender.awarded_contractor_id, Some(ActorId::new("contractor-1")));
        assert_eq!(tender.awarded_amount, Some(125_000));
        assert_eq!(tender.awarded_at, Some(now));
        assert_eq!(tender.status, TenderStatus::Awarded);
        assert_eq!(tender.workflow_stage, TenderStage::Awarded);
    }

    #[test]
    fn test_award_is_write_once() {
        let mut tender = make_tender();
        tender.award(ActorId::new("contractor-1"), 100, Utc::now());
        tender.award(ActorId::new("contractor-2"), 200, Utc::now());

        assert_eq!(tender.awarded_contractor_id, Some(ActorId::new("contractor-1")));
        assert_eq!(tender.awarded_amount, Some(100));
    }

    #[test]
    fn test_stage_ordering() {
        for pair in TenderStage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(TenderStage::Awarded < TenderStage::Verified);
    }
}
