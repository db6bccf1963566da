//! Civic issue workflow engine
//!
//! Tracks civic issues from citizen report through resolution, routing them
//! across administrative roles and coupling that routing to the tendering
//! and work-progress pipeline. Transitions are validated against closed
//! tables, and the two cross-entity cascades (bid acceptance awards the
//! tender and reassigns the issue; completion approval resolves both) run
//! inside the same atomic unit of work as the transition that triggered
//! them.
//!
//! # Architecture
//!
//! [`CivicEngine`] composes specialized components:
//!
//! - `validator` — pure verdicts from the transition and role tables
//! - [`EntityStore`] — single owner of all records; one lock, one unit of work
//! - `cascade` — derived transitions on related entities
//! - `router` — materializes assignment rows as issues move between owners
//!
//! # Example
//!
//! ```rust
//! use civicflow_engine::CivicEngine;
//! use civicflow_types::{Actor, ActorId, ActorRole, EntityType, IssueStage, TransitionPayload};
//!
//! let engine = CivicEngine::new();
//! let issue = engine
//!     .report_issue("Pothole", "Main St & 3rd", ActorId::new("citizen-7"))
//!     .unwrap();
//!
//! let admin = Actor::new("admin-1", ActorRole::Admin);
//! let payload = TransitionPayload::empty().with_assignee(ActorId::new("area-5"));
//! let snapshot = engine
//!     .request_transition(EntityType::Issue, &issue.id.0, "begin_area_review", &admin, &payload)
//!     .unwrap();
//!
//! assert_eq!(snapshot.as_issue().unwrap().workflow_stage, IssueStage::AreaReview);
//! assert_eq!(engine.list_active_assignments(&issue.id).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod cascade;
pub mod clock;
pub mod orchestrator;
pub mod router;
pub mod store;
pub mod validator;

pub use clock::{Clock, FixedClock, IdGenerator, SequenceIds, SystemClock, UuidGenerator};
pub use orchestrator::CivicEngine;
pub use store::EntityStore;
