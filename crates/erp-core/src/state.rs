//! Client-side screen state
//!
//! A verification screen holds the list it last loaded plus the requests it
//! is waiting on. [`reduce`] is the only way to change it: a pure function
//! of the previous state and one event. Responses for requests that are no
//! longer in flight (the user navigated away) are dropped.

use erp_queue::BatchGroup;
use erp_store::{Entity, EntityId, EntityKind, EntityStatus};
use erp_workflow::BatchOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Client-assigned request number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

/// Verification screen state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Kind the screen is showing
    pub kind: Option<EntityKind>,
    /// Pending entities, oldest first
    pub queue: Vec<Entity>,
    /// Pending batches, oldest first
    pub batches: Vec<BatchGroup>,
    /// Requests awaiting a response
    pub in_flight: BTreeSet<RequestId>,
    /// Last success message
    pub notice: Option<String>,
    /// Last failure message
    pub last_error: Option<String>,
}

impl AppState {
    /// Check if any request is outstanding
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    fn settle(&mut self, request: RequestId) -> bool {
        self.in_flight.remove(&request)
    }

    fn drop_entities(&mut self, ids: &BTreeSet<EntityId>) {
        self.queue.retain(|e| !ids.contains(&e.id));
        for group in &mut self.batches {
            group.entities.retain(|e| !ids.contains(&e.id));
        }
        self.batches.retain(|g| !g.entities.is_empty());
    }
}

/// Something that happened on the screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppEvent {
    /// Request sent
    RequestStarted {
        /// Request number
        request: RequestId,
    },
    /// Request failed with a user-facing message
    RequestFailed {
        /// Request number
        request: RequestId,
        /// Message to show
        message: String,
    },
    /// Single-mode list arrived
    QueueLoaded {
        /// Request number
        request: RequestId,
        /// Listed kind
        kind: EntityKind,
        /// Pending entities
        entities: Vec<Entity>,
    },
    /// Batch-mode list arrived
    BatchesLoaded {
        /// Request number
        request: RequestId,
        /// Listed kind
        kind: EntityKind,
        /// Pending batches
        batches: Vec<BatchGroup>,
    },
    /// Submission accepted
    EntitySubmitted {
        /// Request number
        request: RequestId,
        /// Created entities
        entities: Vec<Entity>,
    },
    /// Single decision accepted
    EntityDecided {
        /// Request number
        request: RequestId,
        /// Updated entity
        entity: Entity,
    },
    /// Batch decision finished
    BatchDecided {
        /// Request number
        request: RequestId,
        /// Per-item results
        outcome: BatchOutcome,
    },
    /// User left the screen
    NavigatedAway,
}

/// Apply one event
#[must_use]
pub fn reduce(mut state: AppState, event: AppEvent) -> AppState {
    match event {
        AppEvent::RequestStarted { request } => {
            state.in_flight.insert(request);
            state.last_error = None;
        }
        AppEvent::RequestFailed { request, message } => {
            if state.settle(request) {
                state.last_error = Some(message);
                state.notice = None;
            }
        }
        AppEvent::QueueLoaded {
            request,
            kind,
            entities,
        } => {
            if state.settle(request) {
                state.kind = Some(kind);
                state.queue = entities;
            }
        }
        AppEvent::BatchesLoaded {
            request,
            kind,
            batches,
        } => {
            if state.settle(request) {
                state.kind = Some(kind);
                state.batches = batches;
            }
        }
        AppEvent::EntitySubmitted { request, entities } => {
            if state.settle(request) {
                let count = entities.len();
                let shown = state.kind;
                state.queue.extend(entities.into_iter().filter(|e| {
                    Some(e.kind) == shown && e.status == EntityStatus::PendingVerification
                }));
                state.notice = Some(format!("{count} submitted for verification"));
            }
        }
        AppEvent::EntityDecided { request, entity } => {
            if state.settle(request) {
                let verb = match entity.status {
                    EntityStatus::Approved => "approved",
                    EntityStatus::Rejected => "rejected",
                    _ => "updated",
                };
                state.notice = Some(format!("{} {verb}", entity.kind));
                state.drop_entities(&BTreeSet::from([entity.id]));
            }
        }
        AppEvent::BatchDecided { request, outcome } => {
            if state.settle(request) {
                state.drop_entities(&outcome.succeeded.iter().copied().collect());
                state.notice = Some(format!("{} of {} processed", outcome.succeeded.len(), outcome.total()));
                state.last_error = (!outcome.failed.is_empty())
                    .then(|| format!("{} item(s) could not be processed", outcome.failed.len()));
            }
        }
        AppEvent::NavigatedAway => {
            if !state.in_flight.is_empty() {
                tracing::debug!(discarded = state.in_flight.len(), "discarding in-flight requests");
            }
            state = AppState::default();
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_store::{EntityPayload, HsnKind, HsnPayload, RoleId};
    use erp_workflow::BatchFailure;

    fn pending(code: &str) -> Entity {
        let payload = EntityPayload::HsnCode(HsnPayload::new(code, HsnKind::Hsn, "Goods", 18.0));
        let mut entity = Entity::draft(payload, RoleId::new("clerk"), None);
        entity.status = EntityStatus::PendingVerification;
        entity
    }

    fn loaded(entities: Vec<Entity>) -> AppState {
        let state = reduce(AppState::default(), AppEvent::RequestStarted { request: RequestId(1) });
        reduce(
            state,
            AppEvent::QueueLoaded {
                request: RequestId(1),
                kind: EntityKind::HsnCode,
                entities,
            },
        )
    }

    #[test]
    fn load_settles_request() {
        let state = loaded(vec![pending("8471")]);
        assert_eq!(state.queue.len(), 1);
        assert!(!state.is_loading());
    }

    #[test]
    fn decision_removes_entity() {
        let entity = pending("8471");
        let state = loaded(vec![entity.clone(), pending("8472")]);
        let state = reduce(state, AppEvent::RequestStarted { request: RequestId(2) });

        let mut approved = entity;
        approved.status = EntityStatus::Approved;
        let state = reduce(state, AppEvent::EntityDecided { request: RequestId(2), entity: approved });

        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.notice.as_deref(), Some("HSN approved"));
    }

    #[test]
    fn navigation_discards_late_responses() {
        let state = reduce(AppState::default(), AppEvent::RequestStarted { request: RequestId(7) });
        let state = reduce(state, AppEvent::NavigatedAway);
        assert!(!state.is_loading());

        let state = reduce(
            state,
            AppEvent::QueueLoaded {
                request: RequestId(7),
                kind: EntityKind::HsnCode,
                entities: vec![pending("8471")],
            },
        );
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn batch_failures_surface_as_error() {
        let a = pending("8471");
        let b = pending("8472");
        let state = loaded(vec![a.clone(), b.clone()]);
        let state = reduce(state, AppEvent::RequestStarted { request: RequestId(3) });
        let state = reduce(
            state,
            AppEvent::BatchDecided {
                request: RequestId(3),
                outcome: BatchOutcome {
                    succeeded: vec![a.id],
                    failed: vec![BatchFailure { id: b.id, reason: "already finalized".into() }],
                },
            },
        );

        assert_eq!(state.queue.iter().map(|e| e.id).collect::<Vec<_>>(), vec![b.id]);
        assert_eq!(state.notice.as_deref(), Some("1 of 2 processed"));
        assert_eq!(state.last_error.as_deref(), Some("1 item(s) could not be processed"));
    }

    #[test]
    fn failure_is_shown_once_settled() {
        let state = reduce(AppState::default(), AppEvent::RequestStarted { request: RequestId(1) });
        let state = reduce(
            state,
            AppEvent::RequestFailed { request: RequestId(1), message: "remarks required".into() },
        );
        assert_eq!(state.last_error.as_deref(), Some("remarks required"));
        assert!(!state.is_loading());
    }
}
