use erp_store::{EntityPayload, EntityStatus, HsnKind, HsnPayload, InMemoryStore, RoleId};
use erp_workflow::state_machine::{allowed_transitions, validate_transition};
use erp_workflow::{RoutingTable, WorkflowEngine};
use proptest::prelude::*;
use std::sync::Arc;

fn any_status() -> impl Strategy<Value = EntityStatus> {
    prop_oneof![
        Just(EntityStatus::Draft),
        Just(EntityStatus::PendingVerification),
        Just(EntityStatus::Approved),
        Just(EntityStatus::Rejected),
    ]
}

#[test]
fn test_pending_transitions() {
    assert!(validate_transition(EntityStatus::PendingVerification, EntityStatus::Approved).is_ok());
    assert!(validate_transition(EntityStatus::PendingVerification, EntityStatus::Rejected).is_ok());

    // Invalid
    assert!(validate_transition(EntityStatus::PendingVerification, EntityStatus::Draft).is_err());
}

#[test]
fn test_draft_only_submits() {
    assert!(validate_transition(EntityStatus::Draft, EntityStatus::PendingVerification).is_ok());
    assert!(validate_transition(EntityStatus::Draft, EntityStatus::Approved).is_err());
}

#[test]
fn test_terminal_statuses_have_no_exits() {
    assert!(allowed_transitions(EntityStatus::Approved).is_empty());
    assert!(allowed_transitions(EntityStatus::Rejected).is_empty());
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_status(), to in any_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_first_decision_sticks(decisions in prop::collection::vec(any::<bool>(), 1..8)) {
        let engine = WorkflowEngine::new(Arc::new(InMemoryStore::new()), RoutingTable::with_defaults());
        let payload = EntityPayload::HsnCode(HsnPayload::new("8471", HsnKind::Hsn, "Computers", 18.0));
        let entity = engine.submit(payload, &RoleId::new("clerk"), None).unwrap();
        let reviewer = RoleId::new("TAX_REVIEWER");

        let first = if decisions[0] { EntityStatus::Approved } else { EntityStatus::Rejected };
        for (i, approve) in decisions.iter().enumerate() {
            let result = if *approve {
                engine.approve(entity.id, &reviewer, "checked")
            } else {
                engine.reject(entity.id, &reviewer, "checked")
            };
            prop_assert_eq!(result.is_ok(), i == 0);
        }

        let stored = engine.get(entity.id).unwrap();
        prop_assert_eq!(stored.status, first);
        // submission plus exactly one decision
        prop_assert_eq!(stored.remarks_history.len(), 2);
    }
}
