//! Batch decision results

use erp_store::EntityId;
use serde::{Deserialize, Serialize};

/// A member that could not be decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Entity id
    pub id: EntityId,
    /// Discrete, user-facing reason
    pub reason: String,
}

/// Per-item results of a batch decision; siblings never roll back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Entities decided
    pub succeeded: Vec<EntityId>,
    /// Entities skipped or failed
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Every member succeeded
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Members processed
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
