//! Cascade engine: derived transitions on related entities
//!
//! What the source system did with database triggers happens here as
//! direct, ordered function calls, invoked by the store while it still
//! holds the write lock of the triggering transition. Two rules exist:
//! bid acceptance awards the tender and reassigns the source issue;
//! approval of a completion-type progress record resolves the tender and
//! the issue.
//!
//! The secondary (issue-side) half is best-effort: a missing or already
//! resolved issue degrades to a logged no-op, never to a caller-visible
//! error, and never corrupts issue state.

use crate::clock::{Clock, IdGenerator};
use crate::router;
use crate::store::Tables;
use civicflow_types::{
    ActorId, Bid, BidStatus, IssueId, IssueStage, IssueStatus, TenderStage, TenderStatus,
    WorkProgressRecord,
};

/// Award cascade, fired when a pending bid transitions to accepted.
///
/// Caller guarantees the bid's prior status was not `accepted`, so a no-op
/// rewrite can never re-fire this.
pub(crate) fn on_bid_accepted(
    tables: &mut Tables,
    bid: &Bid,
    accepted_by: &ActorId,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
) {
    let now = clock.now();

    let source_issue_id: Option<IssueId> = match tables.tenders.get_mut(&bid.tender_id) {
        None => {
            tracing::warn!(
                tender_id = %bid.tender_id,
                bid_id = %bid.id,
                "cascade target missing: tender for accepted bid"
            );
            return;
        }
        Some(tender) => {
            if tender.is_awarded() {
                tracing::debug!(
                    tender_id = %tender.id,
                    "tender already awarded, award cascade skipped"
                );
                return;
            }
            tender.award(bid.user_id.clone(), bid.amount, now);
            tender.touch(now);
            tracing::info!(
                tender_id = %tender.id,
                contractor_id = %bid.user_id,
                amount = bid.amount,
                "tender awarded"
            );
            tender.source_issue_id.clone()
        }
    };

    // Sibling bids still pending are implicitly rejected
    for sibling in tables
        .bids
        .values_mut()
        .filter(|b| b.tender_id == bid.tender_id && b.id != bid.id)
    {
        if sibling.status == BidStatus::Pending {
            sibling.status = BidStatus::Rejected;
            sibling.touch(now);
        }
    }

    let Some(issue_id) = source_issue_id else {
        return;
    };

    let reroute = match tables.issues.get_mut(&issue_id) {
        None => {
            tracing::warn!(
                issue_id = %issue_id,
                tender_id = %bid.tender_id,
                "cascade target missing: source issue for awarded tender"
            );
            return;
        }
        Some(issue) => {
            if issue.is_resolved() {
                tracing::debug!(issue_id = %issue.id, "issue already resolved, reassignment skipped");
                return;
            }
            // Stage never regresses; only advance if the issue has not
            // already passed contractor assignment.
            let entered = issue.workflow_stage < IssueStage::ContractorAssigned;
            if entered {
                issue.workflow_stage = IssueStage::ContractorAssigned;
            }
            let reassigned = issue.current_assignee_id.as_ref() != Some(&bid.user_id);
            issue.status = IssueStatus::InProgress;
            issue.current_assignee_id = Some(bid.user_id.clone());
            issue.touch(now);
            entered || reassigned
        }
    };

    // A fresh stage entry and a changed owner both need an assignment row;
    // the router skips unrouted stages on its own.
    if reroute {
        router::record_stage_entry(tables, &issue_id, accepted_by, now, ids);
    }
}

/// Resolution cascade, fired when a completion-type progress record
/// transitions to approved.
///
/// Re-fire guard: once the tender has reached `verified`, a later approval
/// of another completion record is a logged no-op for both tender and issue.
pub(crate) fn on_completion_approved(
    tables: &mut Tables,
    record: &WorkProgressRecord,
    clock: &dyn Clock,
) {
    let now = clock.now();
    let today = clock.today();

    let source_issue_id: Option<IssueId> = match tables.tenders.get_mut(&record.tender_id) {
        None => {
            tracing::warn!(
                tender_id = %record.tender_id,
                record_id = %record.id,
                "cascade target missing: tender for approved completion"
            );
            return;
        }
        Some(tender) => {
            if tender.workflow_stage >= TenderStage::Verified {
                tracing::debug!(
                    tender_id = %tender.id,
                    "tender already verified, completion cascade skipped"
                );
                return;
            }
            tender.status = TenderStatus::Completed;
            tender.workflow_stage = TenderStage::Verified;
            if tender.completion_date.is_none() {
                tender.completion_date = Some(today);
            }
            tender.touch(now);
            tracing::info!(tender_id = %tender.id, "tender work verified");
            tender.source_issue_id.clone()
        }
    };

    let Some(issue_id) = source_issue_id else {
        return;
    };

    match tables.issues.get_mut(&issue_id) {
        None => {
            tracing::warn!(
                issue_id = %issue_id,
                tender_id = %record.tender_id,
                "cascade target missing: source issue for verified tender"
            );
        }
        Some(issue) => {
            if issue.is_resolved() {
                tracing::debug!(issue_id = %issue.id, "issue already resolved, resolution skipped");
                return;
            }
            issue.mark_resolved(now, today);
            issue.touch(now);
            tracing::info!(issue_id = %issue.id, "issue resolved by completion approval");
        }
    }
}
