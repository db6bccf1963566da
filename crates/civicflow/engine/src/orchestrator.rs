//! Civic engine facade: the entry point collaborators call
//!
//! The engine composes the entity store, the transition validator, the
//! cascade engine, and the assignment router. Collaborators (API/UI layer)
//! speak the wire interface: entity type, entity id, transition name,
//! pre-authorized actor, payload. The engine never authenticates — the
//! access guard collaborator resolved the actor before the call.

use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::store::EntityStore;
use civicflow_types::{
    Actor, ActorId, Assignment, AssignmentId, Bid, BidId, BidTransition, DepartmentId,
    EngineError, EngineResult, EntitySnapshot, EntityType, Issue, IssueId, IssueTransition,
    ProgressId, ProgressTransition, ProgressType, Tender, TenderId, TenderTransition,
    TransitionPayload, WorkProgressRecord,
};
use std::sync::Arc;

/// The workflow engine facade
pub struct CivicEngine {
    store: EntityStore,
}

impl CivicEngine {
    /// Engine with wall clock and random ids
    pub fn new() -> Self {
        Self::with_parts(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }

    /// Engine with injected clock and id generator, for deterministic tests
    pub fn with_parts(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            store: EntityStore::new(clock, ids),
        }
    }

    // ── Creation ─────────────────────────────────────────────────────

    pub fn report_issue(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        reported_by: ActorId,
    ) -> EngineResult<Issue> {
        self.store.report_issue(title, description, reported_by)
    }

    pub fn create_tender(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        source_issue_id: Option<IssueId>,
        department_id: Option<DepartmentId>,
    ) -> EngineResult<Tender> {
        self.store
            .create_tender(title, description, source_issue_id, department_id)
    }

    pub fn place_bid(
        &self,
        tender_id: &TenderId,
        user_id: ActorId,
        amount: i64,
    ) -> EngineResult<Bid> {
        self.store.place_bid(tender_id, user_id, amount)
    }

    pub fn create_progress_record(
        &self,
        tender_id: &TenderId,
        contractor_id: ActorId,
        progress_type: ProgressType,
        progress_percentage: u8,
        note: impl Into<String>,
    ) -> EngineResult<WorkProgressRecord> {
        self.store.create_progress_record(
            tender_id,
            contractor_id,
            progress_type,
            progress_percentage,
            note,
        )
    }

    // ── Wire interface ───────────────────────────────────────────────

    /// Apply a named transition to one entity.
    ///
    /// A name that parses for the entity type goes through the validator
    /// and, if accepted, commits together with its cascades and routing. A
    /// name no table knows denies as an illegal transition from the
    /// entity's current state; an unknown id denies as not found first.
    pub fn request_transition(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        transition: &str,
        actor: &Actor,
        payload: &TransitionPayload,
    ) -> EngineResult<EntitySnapshot> {
        match entity_type {
            EntityType::Issue => {
                let id = IssueId::new(entity_id);
                match transition.parse::<IssueTransition>() {
                    Ok(t) => self
                        .store
                        .apply_issue_transition(&id, t, actor, payload)
                        .map(EntitySnapshot::Issue),
                    Err(()) => {
                        let issue = self.store.get_issue(&id)?;
                        Err(Self::unknown_transition(
                            entity_type,
                            issue.workflow_stage.to_string(),
                            transition,
                        ))
                    }
                }
            }
            EntityType::Tender => {
                let id = TenderId::new(entity_id);
                match transition.parse::<TenderTransition>() {
                    Ok(t) => self
                        .store
                        .apply_tender_transition(&id, t, actor)
                        .map(EntitySnapshot::Tender),
                    Err(()) => {
                        let tender = self.store.get_tender(&id)?;
                        Err(Self::unknown_transition(
                            entity_type,
                            tender.workflow_stage.to_string(),
                            transition,
                        ))
                    }
                }
            }
            EntityType::Bid => {
                let id = BidId::new(entity_id);
                match transition.parse::<BidTransition>() {
                    Ok(t) => self
                        .store
                        .apply_bid_transition(&id, t, actor)
                        .map(EntitySnapshot::Bid),
                    Err(()) => {
                        let bid = self.store.get_bid(&id)?;
                        Err(Self::unknown_transition(
                            entity_type,
                            bid.status.to_string(),
                            transition,
                        ))
                    }
                }
            }
            EntityType::WorkProgress => {
                let id = ProgressId::new(entity_id);
                match transition.parse::<ProgressTransition>() {
                    Ok(t) => self
                        .store
                        .apply_progress_transition(&id, t, actor, payload)
                        .map(EntitySnapshot::WorkProgress),
                    Err(()) => {
                        let record = self.store.get_progress_record(&id)?;
                        Err(Self::unknown_transition(
                            entity_type,
                            record.status.to_string(),
                            transition,
                        ))
                    }
                }
            }
            // Assignments are routed by the engine, never transitioned
            // directly by callers.
            EntityType::Assignment => {
                let assignment = self.store.get_assignment(&AssignmentId::new(entity_id))?;
                Err(Self::unknown_transition(
                    entity_type,
                    assignment.status.to_string(),
                    transition,
                ))
            }
        }
    }

    fn unknown_transition(entity: EntityType, from: String, transition: &str) -> EngineError {
        EngineError::IllegalTransition {
            entity,
            from,
            transition: transition.to_string(),
        }
    }

    /// Snapshot of one entity
    pub fn get_entity(&self, entity_type: EntityType, entity_id: &str) -> EngineResult<EntitySnapshot> {
        match entity_type {
            EntityType::Issue => self
                .store
                .get_issue(&IssueId::new(entity_id))
                .map(EntitySnapshot::Issue),
            EntityType::Tender => self
                .store
                .get_tender(&TenderId::new(entity_id))
                .map(EntitySnapshot::Tender),
            EntityType::Bid => self
                .store
                .get_bid(&BidId::new(entity_id))
                .map(EntitySnapshot::Bid),
            EntityType::WorkProgress => self
                .store
                .get_progress_record(&ProgressId::new(entity_id))
                .map(EntitySnapshot::WorkProgress),
            EntityType::Assignment => self
                .store
                .get_assignment(&AssignmentId::new(entity_id))
                .map(EntitySnapshot::Assignment),
        }
    }

    // ── Typed reads ──────────────────────────────────────────────────

    pub fn get_issue(&self, id: &IssueId) -> EngineResult<Issue> {
        self.store.get_issue(id)
    }

    pub fn get_tender(&self, id: &TenderId) -> EngineResult<Tender> {
        self.store.get_tender(id)
    }

    pub fn get_bid(&self, id: &BidId) -> EngineResult<Bid> {
        self.store.get_bid(id)
    }

    pub fn get_progress_record(&self, id: &ProgressId) -> EngineResult<WorkProgressRecord> {
        self.store.get_progress_record(id)
    }

    pub fn list_bids_for_tender(&self, tender_id: &TenderId) -> EngineResult<Vec<Bid>> {
        self.store.list_bids_for_tender(tender_id)
    }

    /// Full assignment history for an issue, in creation order
    pub fn list_assignments(&self, issue_id: &IssueId) -> EngineResult<Vec<Assignment>> {
        self.store.list_assignments(issue_id)
    }

    /// Active assignments for an issue, in creation order
    pub fn list_active_assignments(&self, issue_id: &IssueId) -> EngineResult<Vec<Assignment>> {
        self.store.list_active_assignments(issue_id)
    }
}

impl Default for CivicEngine {
    fn default() -> Self {
        Self::new()
    }
}
