//! Error types for the entity store

use crate::entity::{EntityKind, EntityStatus};
use crate::ids::EntityId;

/// Payload schema violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Required field absent or blank
    #[error("{field} is required")]
    MissingField {
        /// Field name as shown to the user
        field: &'static str,
    },

    /// Field present but malformed
    #[error("{field}: {reason}")]
    InvalidField {
        /// Field name as shown to the user
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl SchemaError {
    /// Create invalid field error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Persistence errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No entity with this id
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// An active entity already holds the unique key
    #[error("duplicate {kind}: {key} already exists")]
    Duplicate {
        /// Entity type
        kind: EntityKind,
        /// Normalized unique key
        key: String,
    },

    /// Check-and-set lost: status changed underneath the caller
    #[error("entity {id} is {actual}, expected {expected}")]
    StatusConflict {
        /// Entity id
        id: EntityId,
        /// Status the caller expected
        expected: EntityStatus,
        /// Status actually stored
        actual: EntityStatus,
    },

    /// Persistence collaborator failed
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
