//! Engine error taxonomy
//!
//! Every caller-visible failure is one of these variants. Only
//! [`EngineError::Contention`] is worth retrying; the rest are terminal for
//! the request. Missing cascade targets are never surfaced here — the
//! cascade engine degrades to a logged no-op instead.

use crate::{ActorRole, EntityType};
use thiserror::Error;

/// Errors surfaced by the workflow engine
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The (state, transition) pair is absent from the transition table
    #[error("illegal transition '{transition}' from state '{from}' on {entity}")]
    IllegalTransition {
        entity: EntityType,
        from: String,
        transition: String,
    },

    /// The actor's role is not permitted for this transition
    #[error("role '{role}' may not perform '{transition}' on {entity}")]
    ForbiddenRole {
        entity: EntityType,
        role: ActorRole,
        transition: String,
    },

    /// A supplied field is outside its domain
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The addressed entity does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityType, id: String },

    /// Store lock could not be acquired within the bounded wait
    #[error("store contention, retry the request")]
    Contention,

    /// A writer panicked while holding the store lock; state may be
    /// inconsistent and the request must not be retried
    #[error("store lock poisoned")]
    Poisoned,
}

impl EngineError {
    /// Whether the caller should retry the identical request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention)
    }

    pub fn not_found(entity: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }
}

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contention_is_retryable() {
        assert!(EngineError::Contention.is_retryable());
        assert!(!EngineError::Poisoned.is_retryable());
        assert!(!EngineError::not_found(EntityType::Issue, "x").is_retryable());
        assert!(!EngineError::invalid_value("bad").is_retryable());
        assert!(!EngineError::IllegalTransition {
            entity: EntityType::Bid,
            from: "accepted".into(),
            transition: "accept".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::ForbiddenRole {
            entity: EntityType::Bid,
            role: ActorRole::Citizen,
            transition: "accept".into(),
        };
        assert_eq!(err.to_string(), "role 'citizen' may not perform 'accept' on bid");

        let err = EngineError::not_found(EntityType::Tender, "t-404");
        assert_eq!(err.to_string(), "tender 't-404' not found");
    }
}
