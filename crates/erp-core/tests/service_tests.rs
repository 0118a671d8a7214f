use erp_core::{BulkUpload, ErpConfig, ErpError, ErpService};
use erp_store::{EntityKind, EntityStatus};
use erp_test_utils::{
    base_code, clerk, client_po, hsn, master_data_reviewer, sales_reviewer, standard_units,
    tax_reviewer, unit, weight_units,
};
use erp_units::{UnitDefinition, UnitType};
use erp_workflow::ValidationError;
use pretty_assertions::assert_eq;

fn seeded(units: Vec<UnitDefinition>) -> ErpService {
    let config = units.into_iter().fold(ErpConfig::new(), ErpConfig::with_seed_unit);
    ErpService::new(&config).unwrap()
}

#[test]
fn kg_to_mt_uses_registered_factor() {
    let service = seeded(weight_units());
    let tonnes = service.convert("KG", "MT", 1000.0).unwrap();
    assert!((tonnes - 1.0).abs() < 1e-12);
}

#[test]
fn approved_unit_becomes_convertible() {
    let service = seeded(weight_units());
    let quintal = UnitDefinition::new("QTL", "Quintal", UnitType::Weight).convert_to("KG", 100.0);
    let entity = service.submit(unit(quintal), &clerk(), None).unwrap();

    assert_eq!(
        service.convert("QTL", "KG", 1.0),
        Err(ErpError::NotFound("unit QTL".into()))
    );

    service.approve(entity.id, &master_data_reviewer(), "factor checked").unwrap();
    assert!((service.convert("QTL", "MT", 10.0).unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(service.approved(EntityKind::Unit).unwrap().len(), 1);
}

#[test]
fn competing_base_unit_is_vetoed() {
    let service = seeded(weight_units());
    let second_base = UnitDefinition::new("LB", "Pound", UnitType::Weight).base();
    let err = service.submit(unit(second_base), &clerk(), None).unwrap_err();
    assert_eq!(err.kind(), "VALIDATION");
    assert_eq!(err.user_message(), "WEIGHT already has base unit KG");
}

#[test]
fn pending_base_units_race_at_approval() {
    let service = seeded(Vec::new());
    let kg = service
        .submit(unit(UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base()), &clerk(), None)
        .unwrap();
    let lb = service
        .submit(unit(UnitDefinition::new("LB", "Pound", UnitType::Weight).base()), &clerk(), None)
        .unwrap();

    service.approve(kg.id, &master_data_reviewer(), "ok").unwrap();
    let err = service.approve(lb.id, &master_data_reviewer(), "ok").unwrap_err();

    assert!(matches!(err, ErpError::Validation(ValidationError::Invalid(_))));
    assert_eq!(service.get(lb.id).unwrap().status, EntityStatus::PendingVerification);
}

#[test]
fn base_code_allowed_units_include_primary() {
    let service = seeded(standard_units());
    let entity = service.submit(base_code("ROD-01", "kg", &["g", "MT", "G"]), &clerk(), None).unwrap();

    match entity.payload {
        erp_store::EntityPayload::BaseItemCode(base) => {
            assert_eq!(base.allowed_units, vec!["KG", "G", "MT"]);
        }
        other => panic!("unexpected payload {other:?}"),
    }

    let err = service.submit(base_code("ROD-02", "KG", &["M"]), &clerk(), None).unwrap_err();
    assert_eq!(err.user_message(), "allowed unit M is not a WEIGHT unit");
}

#[test]
fn allowed_units_start_with_primary() {
    let service = seeded(standard_units());
    let symbols: Vec<String> = service
        .allowed_units_for("g")
        .unwrap()
        .into_iter()
        .map(|u| u.symbol.to_string())
        .collect();
    assert_eq!(symbols, vec!["G", "KG", "MT"]);

    let others: Vec<String> = service
        .units_by_type(UnitType::Length, Some("cm"))
        .into_iter()
        .map(|u| u.symbol.to_string())
        .collect();
    assert_eq!(others, vec!["M", "KM"]);
}

#[test]
fn client_po_lines_need_known_units() {
    let service = seeded(standard_units());
    let ok = service
        .submit(client_po("PO-1", "Acme", &[("ROD-01", 5.0, "MT")]), &clerk(), None)
        .unwrap();
    service.approve(ok.id, &sales_reviewer(), "confirmed with client").unwrap();

    let err = service
        .submit(client_po("PO-2", "Acme", &[("ROD-01", 5.0, "BAG")]), &clerk(), None)
        .unwrap_err();
    assert_eq!(err.user_message(), "line item ROD-01: unit BAG is not a registered unit");
}

#[test]
fn bulk_upload_is_all_or_nothing() {
    let service = seeded(Vec::new());
    let upload = BulkUpload::new(vec![hsn("8471"), hsn("84x"), hsn("8471"), hsn("8473")], clerk());

    let err = service.submit_bulk(upload).unwrap_err();
    match &err {
        ErpError::UploadRejected { total, rows } => {
            assert_eq!(*total, 4);
            assert_eq!(rows.iter().map(|r| r.row).collect::<Vec<_>>(), vec![2, 3]);
            assert_eq!(rows[1].reason, "HSN 8471 appears more than once in the upload");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(service.queue_for(&tax_reviewer(), EntityKind::HsnCode).unwrap().is_empty());
}

#[test]
fn bulk_rows_share_a_batch() {
    let service = seeded(Vec::new());
    service.submit(hsn("9000"), &clerk(), None).unwrap();

    let receipt = service
        .submit_bulk(BulkUpload::new(vec![hsn("8471"), hsn("8472")], clerk()).with_file_name("hsn.xlsx"))
        .unwrap();
    assert_eq!(receipt.entities.len(), 2);
    assert!(receipt.entities.iter().all(|e| e.creation_batch_id == Some(receipt.batch_id)));

    let groups = service.batches_for(&tax_reviewer(), EntityKind::HsnCode).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].batch_id, receipt.batch_id);

    let outcome = service.approve_batch(receipt.batch_id, &tax_reviewer(), "bulk ok").unwrap();
    assert!(outcome.is_complete());
    assert_eq!(service.approved(EntityKind::HsnCode).unwrap().len(), 2);
}

#[test]
fn bulk_duplicate_against_store() {
    let service = seeded(Vec::new());
    service.submit(hsn("8471"), &clerk(), None).unwrap();

    let err = service
        .submit_bulk(BulkUpload::new(vec![hsn(" 8471 ")], clerk()))
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "upload rejected: 1 of 1 rows failed validation: row 1: duplicate HSN: 8471 already exists"
    );
}

#[test]
fn empty_upload_rejected() {
    let service = seeded(Vec::new());
    let err = service.submit_bulk(BulkUpload::new(Vec::new(), clerk())).unwrap_err();
    assert_eq!(err.user_message(), "upload contains no rows");
}
