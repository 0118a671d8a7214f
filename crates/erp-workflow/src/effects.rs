//! Approval side effects
//!
//! Some entity kinds change what downstream consumers can use once approved
//! (an approved unit becomes available for conversions). Effects get a veto
//! before the status change and run after it. Whatever `prepare` claims is
//! held until `commit` or `abort`, so two approvals cannot both pass the veto.

use crate::error::ValidationError;
use erp_store::{Entity, EntityKind};

/// Side effect of approving an entity
pub trait ApprovalEffect: Send + Sync {
    /// Entity kinds this effect reacts to
    fn applies_to(&self, kind: EntityKind) -> bool;

    /// Veto approval; runs before the status change
    ///
    /// # Errors
    /// Reason approval cannot proceed; the entity stays pending
    fn prepare(&self, _entity: &Entity) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Release whatever `prepare` claimed; runs when the status change is lost
    fn abort(&self, _entity: &Entity) {}

    /// Apply the effect; runs after the status change
    ///
    /// # Errors
    /// Failure description, logged by the engine
    fn commit(&self, entity: &Entity) -> Result<(), String>;
}
