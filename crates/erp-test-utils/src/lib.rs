//! Testing utilities for the ERP workspace
//!
//! Shared fixtures: unit families, payload builders and reviewer roles.

#![allow(missing_docs)]

use chrono::NaiveDate;
use erp_store::{
    BaseCodePayload, ClientPoPayload, EntityPayload, FixedDepositPayload, HsnKind, HsnPayload,
    PoLineItem, RoleId,
};
use erp_units::{ApplicableType, UnitDefinition, UnitType};

/// KG (base), G, MT, with an explicit KG -> MT edge
pub fn weight_units() -> Vec<UnitDefinition> {
    vec![
        UnitDefinition::new("KG", "Kilogram", UnitType::Weight)
            .base()
            .convert_to("MT", 0.001)
            .applicable_to(&[ApplicableType::Material]),
        UnitDefinition::new("G", "Gram", UnitType::Weight)
            .convert_to("KG", 0.001)
            .applicable_to(&[ApplicableType::Material]),
        UnitDefinition::new("MT", "Metric Tonne", UnitType::Weight)
            .convert_to("KG", 1000.0)
            .applicable_to(&[ApplicableType::Material]),
    ]
}

/// Weight, length, quantity and time families
pub fn standard_units() -> Vec<UnitDefinition> {
    let mut units = weight_units();
    units.extend([
        UnitDefinition::new("M", "Metre", UnitType::Length).base(),
        UnitDefinition::new("CM", "Centimetre", UnitType::Length).convert_to("M", 0.01),
        UnitDefinition::new("KM", "Kilometre", UnitType::Length).convert_to("M", 1000.0),
        UnitDefinition::new("NOS", "Numbers", UnitType::Quantity).base(),
        UnitDefinition::new("DOZ", "Dozen", UnitType::Quantity).convert_to("NOS", 12.0),
        UnitDefinition::new("HR", "Hour", UnitType::Time)
            .base()
            .applicable_to(&[ApplicableType::Service]),
        UnitDefinition::new("DAY", "Day", UnitType::Time)
            .convert_to("HR", 24.0)
            .applicable_to(&[ApplicableType::Service]),
    ]);
    units
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn hsn(code: &str) -> EntityPayload {
    EntityPayload::HsnCode(HsnPayload::new(code, HsnKind::Hsn, "Goods", 18.0))
}

pub fn sac(code: &str) -> EntityPayload {
    EntityPayload::HsnCode(HsnPayload::new(code, HsnKind::Sac, "Services", 18.0))
}

pub fn fixed_deposit(account_number: &str) -> EntityPayload {
    EntityPayload::FixedDeposit(FixedDepositPayload {
        account_number: account_number.to_string(),
        bank_name: "State Bank".to_string(),
        branch: None,
        principal_minor: 50_000_000,
        interest_rate_percent: 7.25,
        deposit_date: date(2026, 1, 1),
        maturity_date: date(2027, 1, 1),
    })
}

pub fn unit(def: UnitDefinition) -> EntityPayload {
    EntityPayload::Unit(def)
}

pub fn base_code(code: &str, primary_unit: &str, allowed_units: &[&str]) -> EntityPayload {
    EntityPayload::BaseItemCode(BaseCodePayload {
        code: code.to_string(),
        name: format!("Item {code}"),
        item_type: ApplicableType::Material,
        hsn_code: None,
        primary_unit: primary_unit.to_string(),
        allowed_units: allowed_units.iter().map(|u| (*u).to_string()).collect(),
    })
}

pub fn client_po(po_number: &str, client_name: &str, lines: &[(&str, f64, &str)]) -> EntityPayload {
    EntityPayload::ClientPurchaseOrder(ClientPoPayload {
        po_number: po_number.to_string(),
        client_name: client_name.to_string(),
        po_date: date(2026, 3, 1),
        line_items: lines
            .iter()
            .map(|(item_code, quantity, unit)| PoLineItem {
                item_code: (*item_code).to_string(),
                quantity: *quantity,
                unit: (*unit).to_string(),
            })
            .collect(),
    })
}

pub fn clerk() -> RoleId {
    RoleId::new("CLERK")
}

pub fn tax_reviewer() -> RoleId {
    RoleId::new("TAX_REVIEWER")
}

pub fn accounts_reviewer() -> RoleId {
    RoleId::new("ACCOUNTS_REVIEWER")
}

pub fn master_data_reviewer() -> RoleId {
    RoleId::new("MASTER_DATA_REVIEWER")
}

pub fn sales_reviewer() -> RoleId {
    RoleId::new("SALES_REVIEWER")
}

pub fn admin() -> RoleId {
    RoleId::new("ADMIN")
}
