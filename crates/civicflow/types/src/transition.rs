//! Transition names, payloads, and entity snapshots
//!
//! Transitions arrive over the wire as snake_case names scoped to an entity
//! type. Each entity gets its own closed enum; a name that fails to parse is
//! simply absent from every transition table and denies as an illegal
//! transition.

use crate::{Assignment, Bid, DepartmentId, Issue, Tender, WorkProgressRecord};
use crate::ActorId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ── Entity types ─────────────────────────────────────────────────────

/// The entity kinds the engine transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Issue,
    Tender,
    Bid,
    WorkProgress,
    Assignment,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Tender => "tender",
            Self::Bid => "bid",
            Self::WorkProgress => "work_progress",
            Self::Assignment => "assignment",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Transition names ─────────────────────────────────────────────────

/// Issue pipeline transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTransition {
    BeginAreaReview,
    AssignDepartment,
    AssignContractor,
    StartWork,
    SubmitForReview,
    Resolve,
}

impl IssueTransition {
    pub const ALL: [IssueTransition; 6] = [
        Self::BeginAreaReview,
        Self::AssignDepartment,
        Self::AssignContractor,
        Self::StartWork,
        Self::SubmitForReview,
        Self::Resolve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeginAreaReview => "begin_area_review",
            Self::AssignDepartment => "assign_department",
            Self::AssignContractor => "assign_contractor",
            Self::StartWork => "start_work",
            Self::SubmitForReview => "submit_for_review",
            Self::Resolve => "resolve",
        }
    }
}

impl FromStr for IssueTransition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for IssueTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tender pipeline transitions.
///
/// `under_review -> awarded` and `work_completed -> verified` have no
/// transition name here on purpose: those stage advances only happen through
/// the cascade engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderTransition {
    Publish,
    CloseBidding,
    BeginReview,
    StartWork,
    CompleteWork,
    Finalize,
}

impl TenderTransition {
    pub const ALL: [TenderTransition; 6] = [
        Self::Publish,
        Self::CloseBidding,
        Self::BeginReview,
        Self::StartWork,
        Self::CompleteWork,
        Self::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::CloseBidding => "close_bidding",
            Self::BeginReview => "begin_review",
            Self::StartWork => "start_work",
            Self::CompleteWork => "complete_work",
            Self::Finalize => "finalize",
        }
    }
}

impl FromStr for TenderTransition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for TenderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bid transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidTransition {
    Accept,
    Reject,
    Withdraw,
}

impl BidTransition {
    pub const ALL: [BidTransition; 3] = [Self::Accept, Self::Reject, Self::Withdraw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Withdraw => "withdraw",
        }
    }
}

impl FromStr for BidTransition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for BidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Work progress record transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTransition {
    Submit,
    Approve,
    Reject,
    Revise,
}

impl ProgressTransition {
    pub const ALL: [ProgressTransition; 4] =
        [Self::Submit, Self::Approve, Self::Reject, Self::Revise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Revise => "revise",
        }
    }
}

impl FromStr for ProgressTransition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for ProgressTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Payload ──────────────────────────────────────────────────────────

/// Transition-specific inputs supplied by the caller.
///
/// Which fields are required depends on the transition: routing transitions
/// name the next owner, `assign_department` also names the department.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Department to route to (`assign_department`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    /// Actor to hand ownership to (routing transitions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<ActorId>,
    /// Updated percent complete, inclusive 0..=100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<u8>,
}

impl TransitionPayload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn with_assignee(mut self, assignee_id: ActorId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn with_percentage(mut self, percentage: u8) -> Self {
        self.progress_percentage = Some(percentage);
        self
    }
}

// ── Snapshots ────────────────────────────────────────────────────────

/// A read-only copy of one entity, as returned to collaborators
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum EntitySnapshot {
    Issue(Issue),
    Tender(Tender),
    Bid(Bid),
    WorkProgress(WorkProgressRecord),
    Assignment(Assignment),
}

impl EntitySnapshot {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Issue(_) => EntityType::Issue,
            Self::Tender(_) => EntityType::Tender,
            Self::Bid(_) => EntityType::Bid,
            Self::WorkProgress(_) => EntityType::WorkProgress,
            Self::Assignment(_) => EntityType::Assignment,
        }
    }

    pub fn as_issue(&self) -> Option<&Issue> {
        match self {
            Self::Issue(issue) => Some(issue),
            _ => None,
        }
    }

    pub fn as_tender(&self) -> Option<&Tender> {
        match self {
            Self::Tender(tender) => Some(tender),
            _ => None,
        }
    }

    pub fn as_bid(&self) -> Option<&Bid> {
        match self {
            Self::Bid(bid) => Some(bid),
            _ => None,
        }
    }

    pub fn as_work_progress(&self) -> Option<&WorkProgressRecord> {
        match self {
            Self::WorkProgress(record) => Some(record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_names_round_trip() {
        for t in IssueTransition::ALL {
            assert_eq!(t.as_str().parse::<IssueTransition>(), Ok(t));
        }
        for t in TenderTransition::ALL {
            assert_eq!(t.as_str().parse::<TenderTransition>(), Ok(t));
        }
        for t in BidTransition::ALL {
            assert_eq!(t.as_str().parse::<BidTransition>(), Ok(t));
        }
        for t in ProgressTransition::ALL {
            assert_eq!(t.as_str().parse::<ProgressTransition>(), Ok(t));
        }
    }

    #[test]
    fn test_unknown_transition_name() {
        assert!("escalate".parse::<IssueTransition>().is_err());
        assert!("award".parse::<TenderTransition>().is_err());
        assert!("verify".parse::<TenderTransition>().is_err());
    }

    #[test]
    fn test_payload_builder() {
        let payload = TransitionPayload::empty()
            .with_department(DepartmentId::new("dept-1"))
            .with_assignee(ActorId::new("actor-1"))
            .with_percentage(40);
        assert!(payload.department_id.is_some());
        assert!(payload.assignee_id.is_some());
        assert_eq!(payload.progress_percentage, Some(40));
    }
}
