//! Transition validation
//!
//! Pure verdict computation, no side effects. Two independent tables back
//! each entity type: a state table mapping (current, transition) to the next
//! state, and a role table mapping each transition to its permitted roles.
//! Checks run in a fixed order: state pair first, then role, then payload
//! values, so a caller always sees the most specific denial.

use civicflow_types::{
    ActorRole, BidStatus, BidTransition, EngineError, EngineResult, EntityType, IssueStage,
    IssueTransition, ProgressStatus, ProgressTransition, TenderStage, TenderTransition,
    TransitionPayload,
};

// ── State tables ─────────────────────────────────────────────────────

/// Legal issue stage advances. Absent pairs are illegal.
pub fn next_issue_stage(current: IssueStage, transition: IssueTransition) -> Option<IssueStage> {
    use IssueStage as S;
    use IssueTransition as T;
    match (current, transition) {
        (S::Reported, T::BeginAreaReview) => Some(S::AreaReview),
        (S::AreaReview, T::AssignDepartment) => Some(S::DepartmentAssigned),
        (S::DepartmentAssigned, T::AssignContractor) => Some(S::ContractorAssigned),
        (S::ContractorAssigned, T::StartWork) => Some(S::InProgress),
        (S::InProgress, T::SubmitForReview) => Some(S::DepartmentReview),
        (S::DepartmentReview, T::Resolve) => Some(S::Resolved),
        _ => None,
    }
}

/// Legal tender stage advances. `awarded` and `verified` are only entered by
/// the cascade engine and so have no entry here.
pub fn next_tender_stage(current: TenderStage, transition: TenderTransition) -> Option<TenderStage> {
    use TenderStage as S;
    use TenderTransition as T;
    match (current, transition) {
        (S::Created, T::Publish) => Some(S::Available),
        (S::Available, T::CloseBidding) => Some(S::BiddingClosed),
        (S::BiddingClosed, T::BeginReview) => Some(S::UnderReview),
        (S::Awarded, T::StartWork) => Some(S::WorkInProgress),
        (S::WorkInProgress, T::CompleteWork) => Some(S::WorkCompleted),
        (S::Verified, T::Finalize) => Some(S::Completed),
        _ => None,
    }
}

/// Legal bid status changes. Every target is terminal.
pub fn next_bid_status(current: BidStatus, transition: BidTransition) -> Option<BidStatus> {
    use BidStatus as S;
    use BidTransition as T;
    match (current, transition) {
        (S::Pending, T::Accept) => Some(S::Accepted),
        (S::Pending, T::Reject) => Some(S::Rejected),
        (S::Pending, T::Withdraw) => Some(S::Withdrawn),
        _ => None,
    }
}

/// Legal progress record status changes
pub fn next_progress_status(
    current: ProgressStatus,
    transition: ProgressTransition,
) -> Option<ProgressStatus> {
    use ProgressStatus as S;
    use ProgressTransition as T;
    match (current, transition) {
        (S::Draft, T::Submit) => Some(S::Submitted),
        (S::Submitted, T::Approve) => Some(S::Approved),
        (S::Submitted, T::Reject) => Some(S::Rejected),
        (S::Rejected, T::Revise) => Some(S::Draft),
        _ => None,
    }
}

// ── Role tables ──────────────────────────────────────────────────────

pub fn issue_transition_roles(transition: IssueTransition) -> &'static [ActorRole] {
    use ActorRole as R;
    use IssueTransition as T;
    match transition {
        T::BeginAreaReview => &[R::Admin],
        T::AssignDepartment => &[R::AreaSupervisor, R::Admin],
        T::AssignContractor => &[R::DepartmentAdmin, R::Admin],
        T::StartWork | T::SubmitForReview => &[R::Contractor],
        T::Resolve => &[R::DepartmentAdmin, R::Admin],
    }
}

pub fn tender_transition_roles(transition: TenderTransition) -> &'static [ActorRole] {
    use ActorRole as R;
    use TenderTransition as T;
    match transition {
        T::Publish | T::CloseBidding | T::BeginReview | T::Finalize => {
            &[R::DepartmentAdmin, R::Admin]
        }
        T::StartWork | T::CompleteWork => &[R::Contractor],
    }
}

pub fn bid_transition_roles(transition: BidTransition) -> &'static [ActorRole] {
    use ActorRole as R;
    use BidTransition as T;
    match transition {
        T::Accept | T::Reject => &[R::DepartmentAdmin, R::Admin],
        T::Withdraw => &[R::Contractor],
    }
}

pub fn progress_transition_roles(transition: ProgressTransition) -> &'static [ActorRole] {
    use ActorRole as R;
    use ProgressTransition as T;
    match transition {
        T::Submit | T::Revise => &[R::Contractor],
        T::Approve | T::Reject => &[R::DepartmentAdmin, R::Admin],
    }
}

// ── Value checks ─────────────────────────────────────────────────────

/// Percent complete must lie in the inclusive range 0..=100
pub fn validate_percentage(percentage: u8) -> EngineResult<()> {
    if percentage > 100 {
        return Err(EngineError::invalid_value(format!(
            "progress_percentage {} outside 0..=100",
            percentage
        )));
    }
    Ok(())
}

// ── Combined verdicts ────────────────────────────────────────────────

fn check_role(
    entity: EntityType,
    transition: &str,
    role: ActorRole,
    permitted: &[ActorRole],
) -> EngineResult<()> {
    if permitted.contains(&role) {
        Ok(())
    } else {
        Err(EngineError::ForbiddenRole {
            entity,
            role,
            transition: transition.to_string(),
        })
    }
}

/// Full verdict for an issue transition
pub fn validate_issue(
    current: IssueStage,
    transition: IssueTransition,
    role: ActorRole,
    payload: &TransitionPayload,
) -> EngineResult<IssueStage> {
    let next = next_issue_stage(current, transition).ok_or_else(|| {
        EngineError::IllegalTransition {
            entity: EntityType::Issue,
            from: current.to_string(),
            transition: transition.to_string(),
        }
    })?;
    check_role(
        EntityType::Issue,
        transition.as_str(),
        role,
        issue_transition_roles(transition),
    )?;

    // Routing transitions must name the next owner
    match transition {
        IssueTransition::BeginAreaReview | IssueTransition::AssignContractor => {
            if payload.assignee_id.is_none() {
                return Err(EngineError::invalid_value(format!(
                    "'{}' requires payload.assignee_id",
                    transition
                )));
            }
        }
        IssueTransition::AssignDepartment => {
            if payload.assignee_id.is_none() {
                return Err(EngineError::invalid_value(
                    "'assign_department' requires payload.assignee_id",
                ));
            }
            if payload.department_id.is_none() {
                return Err(EngineError::invalid_value(
                    "'assign_department' requires payload.department_id",
                ));
            }
        }
        _ => {}
    }
    Ok(next)
}

/// Full verdict for a tender transition
pub fn validate_tender(
    current: TenderStage,
    transition: TenderTransition,
    role: ActorRole,
) -> EngineResult<TenderStage> {
    let next = next_tender_stage(current, transition).ok_or_else(|| {
        EngineError::IllegalTransition {
            entity: EntityType::Tender,
            from: current.to_string(),
            transition: transition.to_string(),
        }
    })?;
    check_role(
        EntityType::Tender,
        transition.as_str(),
        role,
        tender_transition_roles(transition),
    )?;
    Ok(next)
}

/// Full verdict for a bid transition
pub fn validate_bid(
    current: BidStatus,
    transition: BidTransition,
    role: ActorRole,
) -> EngineResult<BidStatus> {
    let next =
        next_bid_status(current, transition).ok_or_else(|| EngineError::IllegalTransition {
            entity: EntityType::Bid,
            from: current.to_string(),
            transition: transition.to_string(),
        })?;
    check_role(
        EntityType::Bid,
        transition.as_str(),
        role,
        bid_transition_roles(transition),
    )?;
    Ok(next)
}

/// Full verdict for a progress record transition
pub fn validate_progress(
    current: ProgressStatus,
    transition: ProgressTransition,
    role: ActorRole,
    payload: &TransitionPayload,
) -> EngineResult<ProgressStatus> {
    let next = next_progress_status(current, transition).ok_or_else(|| {
        EngineError::IllegalTransition {
            entity: EntityType::WorkProgress,
            from: current.to_string(),
            transition: transition.to_string(),
        }
    })?;
    check_role(
        EntityType::WorkProgress,
        transition.as_str(),
        role,
        progress_transition_roles(transition),
    )?;
    if let Some(percentage) = payload.progress_percentage {
        validate_percentage(percentage)?;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_issue_happy_path_chain() {
        use IssueStage as S;
        use IssueTransition as T;
        let mut stage = S::Reported;
        let chain = [
            T::BeginAreaReview,
            T::AssignDepartment,
            T::AssignContractor,
            T::StartWork,
            T::SubmitForReview,
            T::Resolve,
        ];
        for t in chain {
            stage = next_issue_stage(stage, t).unwrap();
        }
        assert_eq!(stage, S::Resolved);
    }

    #[test]
    fn test_issue_illegal_pair() {
        let err = validate_issue(
            IssueStage::Reported,
            IssueTransition::Resolve,
            ActorRole::Admin,
            &TransitionPayload::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { .. }));
    }

    #[test]
    fn test_forbidden_role_even_when_pair_is_legal() {
        let err = validate_issue(
            IssueStage::DepartmentReview,
            IssueTransition::Resolve,
            ActorRole::Contractor,
            &TransitionPayload::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ForbiddenRole { .. }));
    }

    #[test]
    fn test_routing_requires_assignee() {
        let err = validate_issue(
            IssueStage::Reported,
            IssueTransition::BeginAreaReview,
            ActorRole::Admin,
            &TransitionPayload::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(_)));
    }

    #[test]
    fn test_assign_department_requires_department() {
        let payload =
            TransitionPayload::empty().with_assignee(civicflow_types::ActorId::new("dept-admin"));
        let err = validate_issue(
            IssueStage::AreaReview,
            IssueTransition::AssignDepartment,
            ActorRole::AreaSupervisor,
            &payload,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(_)));
    }

    #[test]
    fn test_assign_department_requires_assignee() {
        let payload = TransitionPayload::empty()
            .with_department(civicflow_types::DepartmentId::new("dept-roads"));
        let err = validate_issue(
            IssueStage::AreaReview,
            IssueTransition::AssignDepartment,
            ActorRole::AreaSupervisor,
            &payload,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(_)));
    }

    #[test]
    fn test_tender_has_no_public_award_or_verify_path() {
        use TenderStage as S;
        for t in TenderTransition::ALL {
            assert_ne!(next_tender_stage(S::UnderReview, t), Some(S::Awarded));
            assert_ne!(next_tender_stage(S::WorkCompleted, t), Some(S::Verified));
        }
    }

    #[test]
    fn test_bid_accept_only_from_pending() {
        assert_eq!(
            next_bid_status(BidStatus::Pending, BidTransition::Accept),
            Some(BidStatus::Accepted)
        );
        assert_eq!(next_bid_status(BidStatus::Accepted, BidTransition::Accept), None);
        assert_eq!(next_bid_status(BidStatus::Rejected, BidTransition::Accept), None);
        assert_eq!(next_bid_status(BidStatus::Withdrawn, BidTransition::Accept), None);
    }

    #[test]
    fn test_progress_re_approval_is_illegal() {
        let err = validate_progress(
            ProgressStatus::Approved,
            ProgressTransition::Approve,
            ActorRole::DepartmentAdmin,
            &TransitionPayload::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { .. }));
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_percentage(0).is_ok());
        assert!(validate_percentage(100).is_ok());
        assert!(validate_percentage(101).is_err());
        assert!(validate_percentage(255).is_err());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let payload = TransitionPayload::empty();
        let a = validate_progress(
            ProgressStatus::Submitted,
            ProgressTransition::Approve,
            ActorRole::Admin,
            &payload,
        );
        let b = validate_progress(
            ProgressStatus::Submitted,
            ProgressTransition::Approve,
            ActorRole::Admin,
            &payload,
        );
        assert_eq!(a, b);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            max_global_rejects: 65536,
            ..ProptestConfig::default()
        })]

        /// Any (stage, transition) pair outside the issue table denies with
        /// an illegal-transition error, for every role.
        #[test]
        fn prop_absent_issue_pairs_deny(
            stage_idx in 0..IssueStage::ALL.len(),
            t_idx in 0..IssueTransition::ALL.len(),
        ) {
            let stage = IssueStage::ALL[stage_idx];
            let transition = IssueTransition::ALL[t_idx];
            prop_assume!(next_issue_stage(stage, transition).is_none());

            let payload = TransitionPayload::empty();
            for role in [
                ActorRole::Admin,
                ActorRole::AreaSupervisor,
                ActorRole::DepartmentAdmin,
                ActorRole::Contractor,
                ActorRole::Citizen,
            ] {
                let err = validate_issue(stage, transition, role, &payload).unwrap_err();
                prop_assert!(
                    matches!(err, EngineError::IllegalTransition { .. }),
                    "expected IllegalTransition, got {:?}",
                    err
                );
            }
        }

        /// A role outside the permission set denies with forbidden_role even
        /// when the state pair is legal.
        #[test]
        fn prop_unpermitted_roles_deny(
            stage_idx in 0..TenderStage::ALL.len(),
            t_idx in 0..TenderTransition::ALL.len(),
        ) {
            let stage = TenderStage::ALL[stage_idx];
            let transition = TenderTransition::ALL[t_idx];
            prop_assume!(next_tender_stage(stage, transition).is_some());

            let permitted = tender_transition_roles(transition);
            for role in [
                ActorRole::Admin,
                ActorRole::AreaSupervisor,
                ActorRole::DepartmentAdmin,
                ActorRole::Contractor,
                ActorRole::Citizen,
            ] {
                let result = validate_tender(stage, transition, role);
                if permitted.contains(&role) {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert!(
                        matches!(result, Err(EngineError::ForbiddenRole { .. })),
                        "expected ForbiddenRole, got {:?}",
                        result
                    );
                }
            }
        }
    }
}
