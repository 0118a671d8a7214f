//! Error types for the ERP service
//!
//! One taxonomy for every caller-facing operation:
//! - Validation / State: rejected input, never retried
//! - NotFound / IncompatibleUnits / NotPermitted: bad references
//! - Transport: collaborator failure, retried only at the user's request
//! - Unauthenticated / Config: local preconditions

use erp_store::{EntityKind, RoleId, StoreError};
use erp_units::UnitError;
use erp_workflow::{StateError, ValidationError, WorkflowError};
use serde::{Deserialize, Serialize};

/// One failed row of a bulk upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row number within the upload
    pub row: usize,
    /// Discrete, user-facing reason
    pub reason: String,
}

/// Main service error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErpError {
    /// Malformed, missing or duplicate input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Illegal transition
    #[error(transparent)]
    State(#[from] StateError),

    /// Unknown entity, batch or unit
    #[error("{0} not found")]
    NotFound(String),

    /// Conversion between unrelated units
    #[error("cannot convert {from} to {to}: units are not related")]
    IncompatibleUnits {
        /// Source unit symbol
        from: String,
        /// Target unit symbol
        to: String,
    },

    /// Reviewer not routed for the entity kind
    #[error("role {role} may not review {kind}")]
    NotPermitted {
        /// Acting role
        role: RoleId,
        /// Entity type
        kind: EntityKind,
    },

    /// Bulk upload rejected as a whole
    #[error("upload rejected: {} of {total} rows failed validation", .rows.len())]
    UploadRejected {
        /// Rows in the upload
        total: usize,
        /// Failing rows
        rows: Vec<RowError>,
    },

    /// Persistence collaborator failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Missing or blank bearer credential
    #[error("authentication required")]
    Unauthenticated,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ErpError {
    /// Check if the user may retry the action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Stable machine-readable category
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::UploadRejected { .. } => "VALIDATION",
            Self::State(_) => "STATE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::IncompatibleUnits { .. } => "INCOMPATIBLE_UNITS",
            Self::NotPermitted { .. } => "NOT_PERMITTED",
            Self::Transport(_) => "TRANSPORT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Config(_) => "CONFIG",
        }
    }

    /// Discrete, actionable message for display
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UploadRejected { rows, .. } => {
                let details: Vec<String> = rows
                    .iter()
                    .map(|r| format!("row {}: {}", r.row, r.reason))
                    .collect();
                format!("{self}: {}", details.join("; "))
            }
            Self::Transport(_) => "service unavailable, please try again".to_string(),
            Self::Unauthenticated => "sign in required".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<WorkflowError> for ErpError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::Validation(e) => Self::Validation(e),
            WorkflowError::State(e) => Self::State(e),
            WorkflowError::NotFound(what) => Self::NotFound(what),
            WorkflowError::NotPermitted { role, kind } => Self::NotPermitted { role, kind },
            WorkflowError::Transport(reason) => Self::Transport(reason),
        }
    }
}

impl From<UnitError> for ErpError {
    fn from(value: UnitError) -> Self {
        match value {
            UnitError::Validation(message) => Self::Validation(ValidationError::Invalid(message)),
            UnitError::NotFound(symbol) => Self::NotFound(format!("unit {symbol}")),
            UnitError::Incompatible { from, to } => Self::IncompatibleUnits { from, to },
        }
    }
}

impl From<StoreError> for ErpError {
    fn from(value: StoreError) -> Self {
        WorkflowError::from(value).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_store::{EntityId, EntityStatus};

    #[test]
    fn only_transport_is_retryable() {
        assert!(ErpError::Transport("timeout".into()).is_retryable());
        assert!(!ErpError::Unauthenticated.is_retryable());
        assert!(!ErpError::from(ValidationError::RemarksRequired).is_retryable());
    }

    #[test]
    fn domain_messages_are_discrete() {
        assert_eq!(
            ErpError::from(ValidationError::RemarksRequired).user_message(),
            "remarks required"
        );
        let finalized = ErpError::from(StateError::AlreadyFinalized {
            id: EntityId::new(),
            status: EntityStatus::Approved,
        });
        assert_eq!(finalized.user_message(), "already finalized");
        assert_eq!(finalized.kind(), "STATE");
    }

    #[test]
    fn unit_errors_map_into_taxonomy() {
        assert_eq!(
            ErpError::from(UnitError::NotFound("XYZ".into())),
            ErpError::NotFound("unit XYZ".into())
        );
        assert_eq!(
            ErpError::from(UnitError::incompatible("KG", "M")).kind(),
            "INCOMPATIBLE_UNITS"
        );
    }

    #[test]
    fn upload_message_lists_rows() {
        let err = ErpError::UploadRejected {
            total: 3,
            rows: vec![
                RowError { row: 1, reason: "HSN code: must be 2, 4, 6 or 8 digits".into() },
                RowError { row: 3, reason: "duplicate HSN: 8471 already exists".into() },
            ],
        };
        assert_eq!(
            err.user_message(),
            "upload rejected: 2 of 3 rows failed validation: \
             row 1: HSN code: must be 2, 4, 6 or 8 digits; row 3: duplicate HSN: 8471 already exists"
        );
    }
}
