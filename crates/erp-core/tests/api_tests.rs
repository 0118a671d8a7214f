use erp_core::{
    ApiGateway, BatchDecisionRequest, BearerToken, DecisionRequest, ErpConfig, ErpService,
    SubmitPayload, SubmitRequest, Submitted, VerificationListRequest, VerificationListing,
};
use erp_queue::QueueMode;
use erp_store::{EntityKind, EntityStatus};
use erp_test_utils::{clerk, fixed_deposit, hsn, tax_reviewer, weight_units};
use erp_units::UnitType;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn gateway() -> ApiGateway {
    let config = weight_units().into_iter().fold(ErpConfig::new(), ErpConfig::with_seed_unit);
    ApiGateway::new(Arc::new(ErpService::new(&config).unwrap()))
}

fn token() -> BearerToken {
    BearerToken::new("session-token")
}

fn single(payload: erp_store::EntityPayload) -> SubmitRequest {
    SubmitRequest {
        payload: SubmitPayload::One(Box::new(payload)),
        is_excel_upload: false,
        batch_metadata: None,
        submitted_by: clerk(),
    }
}

#[test]
fn missing_token_fails_before_anything_runs() {
    let api = gateway();
    let response = api.submit(None, single(hsn("8471")));

    assert!(!response.success);
    assert_eq!(response.error.unwrap().kind, "UNAUTHENTICATED");
    assert!(api.service().queue_for(&tax_reviewer(), EntityKind::HsnCode).unwrap().is_empty());
}

#[test]
fn submit_then_decide_round_trip() {
    let api = gateway();
    let token = token();

    let submitted = api.submit(Some(&token), single(hsn("8471")));
    let Some(Submitted::One(entity)) = submitted.data else {
        panic!("expected single entity");
    };

    let listing = api.list_for_verification(
        Some(&token),
        &VerificationListRequest {
            reviewer_role_id: tax_reviewer(),
            kind: EntityKind::HsnCode,
            mode: QueueMode::Single,
        },
    );
    assert!(matches!(listing.data, Some(VerificationListing::Single(ref items)) if items.len() == 1));

    let blank = api.approve(
        Some(&token),
        &DecisionRequest {
            entity_id: entity.id,
            reviewer_role_id: tax_reviewer(),
            remarks: " ".into(),
        },
    );
    assert_eq!(blank.error.unwrap().message, "remarks required");

    let approved = api.approve(
        Some(&token),
        &DecisionRequest {
            entity_id: entity.id,
            reviewer_role_id: tax_reviewer(),
            remarks: "ok".into(),
        },
    );
    assert_eq!(approved.data.unwrap().status, EntityStatus::Approved);

    let again = api.reject(
        Some(&token),
        &DecisionRequest {
            entity_id: entity.id,
            reviewer_role_id: tax_reviewer(),
            remarks: "late".into(),
        },
    );
    let error = again.error.unwrap();
    assert_eq!(error.kind, "STATE");
    assert_eq!(error.message, "already finalized");
    assert!(!error.retryable);
}

#[test]
fn excel_upload_lists_as_batch() {
    let api = gateway();
    let token = token();
    let response = api.submit(
        Some(&token),
        SubmitRequest {
            payload: SubmitPayload::Many(vec![fixed_deposit("FD-1"), fixed_deposit("FD-2")]),
            is_excel_upload: true,
            batch_metadata: None,
            submitted_by: clerk(),
        },
    );
    assert!(matches!(response.data, Some(Submitted::Many(ref rows)) if rows.len() == 2));

    let listing = api.list_for_verification(
        Some(&token),
        &VerificationListRequest {
            reviewer_role_id: "accounts_reviewer".into(),
            kind: EntityKind::FixedDeposit,
            mode: QueueMode::Batch,
        },
    );
    let Some(VerificationListing::Batch(groups)) = listing.data else {
        panic!("expected batch listing");
    };
    assert_eq!(groups.len(), 1);

    let decided = api.reject_batch(
        Some(&token),
        &BatchDecisionRequest {
            batch_id: Some(groups[0].batch_id),
            entity_ids: Vec::new(),
            reviewer_role_id: "accounts_reviewer".into(),
            remarks: "wrong bank".into(),
        },
    );
    let results = decided.data.unwrap().results;
    assert_eq!(results.success.len(), 2);
    assert!(results.errors.is_empty());
}

#[test]
fn envelope_json_uses_camel_case() {
    let api = gateway();
    let response = api.allowed_units_by_primary_unit(Some(&token()), "mt");
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["symbol"], "MT");
    assert_eq!(json["data"][0]["unitType"], "WEIGHT");
    assert!(json.get("error").is_none());

    let missing = serde_json::to_value(api.allowed_units_by_primary_unit(Some(&token()), "XYZ")).unwrap();
    assert_eq!(missing["error"]["kind"], "NOT_FOUND");
    assert_eq!(missing["error"]["message"], "unit XYZ not found");
}

#[test]
fn submit_request_parses_from_wire() {
    let raw = r#"{
        "payload": { "kind": "HSN", "code": "8471", "codeKind": "HSN", "description": "Computers", "gstRatePercent": 18.0 },
        "submittedBy": "clerk"
    }"#;
    let request: SubmitRequest = serde_json::from_str(raw).unwrap();
    assert!(!request.is_excel_upload);
    assert!(matches!(request.payload, SubmitPayload::One(_)));

    let units = gateway().units_by_type(Some(&token()), UnitType::Weight, Some("KG"));
    assert_eq!(units.data.unwrap().len(), 2);
}
