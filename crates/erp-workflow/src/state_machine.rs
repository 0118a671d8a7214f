//! Entity lifecycle
//!
//! `Draft -> PendingVerification -> Approved | Rejected`. Approved and
//! rejected are terminal; a rejected record is corrected by submitting a new
//! one.

use crate::error::StateError;
use erp_store::EntityStatus;

/// Validates a status transition.
///
/// Illegal transitions return an error; with the `strict-debug` feature they
/// panic instead so that tests catch the caller.
pub fn validate_transition(from: EntityStatus, to: EntityStatus) -> Result<(), StateError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal status transition attempted: {:?} -> {:?}", from, to);

        #[cfg(not(feature = "strict-debug"))]
        Err(StateError::IllegalTransition { from, to })
    }
}

/// Statuses reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: EntityStatus) -> Vec<EntityStatus> {
    use EntityStatus::*;
    match from {
        Draft => vec![PendingVerification],
        PendingVerification => vec![Approved, Rejected],
        Approved => vec![],
        Rejected => vec![],
    }
}

fn allowed(from: EntityStatus, to: EntityStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
