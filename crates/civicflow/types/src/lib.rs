//! Civic workflow domain types
//!
//! The entity model for the civic issue pipeline: an [`Issue`] reported by a
//! citizen travels through administrative review stages, may spawn a
//! [`Tender`], collects [`Bid`]s, and is worked off through
//! [`WorkProgressRecord`]s. [`Assignment`] rows materialize who currently
//! owns an issue at each routing step.
//!
//! Status and stage columns are closed enums: a value outside the enum
//! cannot be constructed or deserialized, so the store boundary rejects it
//! by construction.

#![deny(unsafe_code)]

pub mod actor;
pub mod assignment;
pub mod bid;
pub mod error;
pub mod issue;
pub mod progress;
pub mod tender;
pub mod transition;

pub use actor::{Actor, ActorId, ActorRole, DepartmentId};
pub use assignment::{Assignment, AssignmentId, AssignmentStatus, AssignmentType};
pub use bid::{Bid, BidId, BidStatus};
pub use error::{EngineError, EngineResult};
pub use issue::{Issue, IssueId, IssueStage, IssueStatus};
pub use progress::{ProgressId, ProgressStatus, ProgressType, WorkProgressRecord};
pub use tender::{Tender, TenderId, TenderStage, TenderStatus};
pub use transition::{
    BidTransition, EntitySnapshot, EntityType, IssueTransition, ProgressTransition,
    TenderTransition, TransitionPayload,
};
