//! Error types for the workflow engine
//!
//! - Validation: malformed, missing or duplicate input
//! - State: illegal transition, e.g. acting on a finalized entity
//! - NotFound / NotPermitted: bad references and routing violations
//! - Transport: the persistence collaborator failed

use erp_store::{EntityId, EntityKind, EntityStatus, RoleId, SchemaError, StoreError};

/// Input rejected before anything was applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Payload schema violation
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Unique key already held by an active entity
    #[error("duplicate {kind}: {key} already exists")]
    Duplicate {
        /// Entity type
        kind: EntityKind,
        /// Normalized unique key
        key: String,
    },

    /// Approve/reject without remarks
    #[error("remarks required")]
    RemarksRequired,

    /// Blank actor role
    #[error("actor role is required")]
    RoleRequired,

    /// Cross-reference or business rule violation
    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    /// Create business rule violation
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Illegal lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Entity already approved or rejected
    #[error("already finalized")]
    AlreadyFinalized {
        /// Entity id
        id: EntityId,
        /// Terminal status it holds
        status: EntityStatus,
    },

    /// Transition not in the state machine
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Current status
        from: EntityStatus,
        /// Requested status
        to: EntityStatus,
    },
}

/// Workflow engine error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Input validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Illegal transition
    #[error(transparent)]
    State(#[from] StateError),

    /// Unknown entity or batch
    #[error("{0} not found")]
    NotFound(String),

    /// Actor is not routed for this entity kind
    #[error("role {role} may not review {kind}")]
    NotPermitted {
        /// Acting role
        role: RoleId,
        /// Entity type
        kind: EntityKind,
    },

    /// Persistence collaborator failure
    #[error("transport failure: {0}")]
    Transport(String),
}

impl WorkflowError {
    /// Check if error is a validation failure
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if error is a state failure
    #[inline]
    #[must_use]
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(format!("entity {id}")),
            StoreError::Duplicate { kind, key } => {
                Self::Validation(ValidationError::Duplicate { kind, key })
            }
            StoreError::StatusConflict { id, actual, .. } if actual.is_terminal() => {
                Self::State(StateError::AlreadyFinalized { id, status: actual })
            }
            StoreError::StatusConflict {
                expected, actual, ..
            } => Self::State(StateError::IllegalTransition {
                from: actual,
                to: expected,
            }),
            StoreError::Unavailable(reason) => Self::Transport(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_finalized_message_is_discrete() {
        let err = WorkflowError::from(StateError::AlreadyFinalized {
            id: EntityId::new(),
            status: EntityStatus::Rejected,
        });
        assert_eq!(err.to_string(), "already finalized");
        assert!(err.is_state());
    }

    #[test]
    fn remarks_required_message() {
        let err = WorkflowError::from(ValidationError::RemarksRequired);
        assert_eq!(err.to_string(), "remarks required");
        assert!(err.is_validation());
    }

    #[test]
    fn store_errors_are_classified() {
        let id = EntityId::new();
        let lost_race = StoreError::StatusConflict {
            id,
            expected: EntityStatus::PendingVerification,
            actual: EntityStatus::Approved,
        };
        assert!(matches!(
            WorkflowError::from(lost_race),
            WorkflowError::State(StateError::AlreadyFinalized { status: EntityStatus::Approved, .. })
        ));
        assert!(matches!(
            WorkflowError::from(StoreError::Unavailable("timeout".into())),
            WorkflowError::Transport(_)
        ));
        assert!(WorkflowError::from(StoreError::Duplicate {
            kind: EntityKind::Unit,
            key: "KG".into()
        })
        .is_validation());
    }
}
