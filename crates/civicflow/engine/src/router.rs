//! Assignment router
//!
//! Observes issue stage entries and materializes assignment rows. Only the
//! three routed stages (`area_review`, `department_assigned`,
//! `contractor_assigned`) produce a row; the router writes assignment
//! records only, never issues or tenders. Creating the new active row of a
//! type completes the prior active row of that same (issue, type) pair.

use crate::clock::IdGenerator;
use crate::store::Tables;
use chrono::{DateTime, Utc};
use civicflow_types::{ActorId, Assignment, AssignmentId, AssignmentType, IssueId};

/// Materialize the assignment row for an issue's current stage, if that
/// stage is a routed one. A no-op otherwise.
pub(crate) fn record_stage_entry(
    tables: &mut Tables,
    issue_id: &IssueId,
    assigned_by: &ActorId,
    now: DateTime<Utc>,
    ids: &dyn IdGenerator,
) {
    let Some(issue) = tables.issues.get(issue_id) else {
        tracing::warn!(issue_id = %issue_id, "router: issue missing, no assignment recorded");
        return;
    };
    let Some(assignment_type) = AssignmentType::for_stage(issue.workflow_stage) else {
        return;
    };
    let Some(assigned_to) = issue.current_assignee_id.clone() else {
        tracing::warn!(
            issue_id = %issue_id,
            stage = %issue.workflow_stage,
            "router: routed stage without assignee, no assignment recorded"
        );
        return;
    };
    let department = issue.assigned_department_id.clone();

    // At most one active row per (issue, type)
    for prior in tables
        .assignments
        .values_mut()
        .filter(|a| &a.issue_id == issue_id && a.assignment_type == assignment_type)
    {
        if prior.is_active() {
            prior.complete(now);
        }
    }

    let assignment = Assignment::new(
        AssignmentId::new(ids.next_id()),
        issue_id.clone(),
        assigned_by.clone(),
        assigned_to,
        department,
        assignment_type,
        now,
    );
    tracing::info!(
        assignment_id = %assignment.id,
        issue_id = %issue_id,
        assignment_type = %assignment_type,
        assigned_to = %assignment.assigned_to,
        "assignment recorded"
    );
    tables.assignment_order.push(assignment.id.clone());
    tables.assignments.insert(assignment.id.clone(), assignment);
}
