//! Entity payloads
//!
//! One variant per entity type. Each variant checks its own schema and
//! exposes the key that must be unique among active entities of its kind.

use crate::entity::EntityKind;
use crate::error::SchemaError;
use chrono::NaiveDate;
use erp_units::{ApplicableType, UnitDefinition, UnitSymbol};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static HSN_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}(?:\d{2}){0,3}$").expect("valid regex"));
static SAC_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^99\d{4}$").expect("valid regex"));

/// Domain payload, tagged by entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EntityPayload {
    /// Fixed deposit
    #[serde(rename = "FIXED_DEPOSIT")]
    FixedDeposit(FixedDepositPayload),
    /// HSN/SAC code
    #[serde(rename = "HSN")]
    HsnCode(HsnPayload),
    /// Base item code
    #[serde(rename = "BASE_ITEM_CODE")]
    BaseItemCode(BaseCodePayload),
    /// Specification
    #[serde(rename = "SPECIFICATION")]
    Specification(SpecificationPayload),
    /// Unit of measure
    #[serde(rename = "UNIT")]
    Unit(UnitDefinition),
    /// Client purchase order
    #[serde(rename = "CLIENT_PO")]
    ClientPurchaseOrder(ClientPoPayload),
}

impl EntityPayload {
    /// Entity kind of this payload
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::FixedDeposit(_) => EntityKind::FixedDeposit,
            EntityPayload::HsnCode(_) => EntityKind::HsnCode,
            EntityPayload::BaseItemCode(_) => EntityKind::BaseItemCode,
            EntityPayload::Specification(_) => EntityKind::Specification,
            EntityPayload::Unit(_) => EntityKind::Unit,
            EntityPayload::ClientPurchaseOrder(_) => EntityKind::ClientPurchaseOrder,
        }
    }

    /// Normalized key that must be unique among active entities of the kind
    #[must_use]
    pub fn unique_key(&self) -> String {
        match self {
            EntityPayload::FixedDeposit(fd) => normalize(&fd.account_number),
            EntityPayload::HsnCode(hsn) => normalize(&hsn.code),
            EntityPayload::BaseItemCode(base) => normalize(&base.code),
            EntityPayload::Specification(spec) => {
                format!("{}/{}", normalize(&spec.base_code), normalize(&spec.spec_code))
            }
            EntityPayload::Unit(unit) => UnitSymbol::normalize(&unit.symbol),
            EntityPayload::ClientPurchaseOrder(po) => {
                format!("{}/{}", normalize(&po.client_name), normalize(&po.po_number))
            }
        }
    }

    /// Check required fields and field formats
    ///
    /// # Errors
    /// First schema violation found
    pub fn check_schema(&self) -> Result<(), SchemaError> {
        match self {
            EntityPayload::FixedDeposit(fd) => fd.check_schema(),
            EntityPayload::HsnCode(hsn) => hsn.check_schema(),
            EntityPayload::BaseItemCode(base) => base.check_schema(),
            EntityPayload::Specification(spec) => spec.check_schema(),
            EntityPayload::Unit(unit) => check_unit_schema(unit),
            EntityPayload::ClientPurchaseOrder(po) => po.check_schema(),
        }
    }

    /// Bring free-text identifiers into canonical form
    ///
    /// Base item codes additionally get their primary unit folded into the
    /// allowed-unit set.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        match &mut self {
            EntityPayload::FixedDeposit(fd) => fd.account_number = normalize(&fd.account_number),
            EntityPayload::HsnCode(hsn) => hsn.code = normalize(&hsn.code),
            EntityPayload::BaseItemCode(base) => base.normalize_units(),
            EntityPayload::Specification(spec) => {
                spec.base_code = normalize(&spec.base_code);
                spec.spec_code = normalize(&spec.spec_code);
            }
            EntityPayload::Unit(unit) => unit.symbol = UnitSymbol::normalize(&unit.symbol),
            EntityPayload::ClientPurchaseOrder(po) => po.po_number = normalize(&po.po_number),
        }
        self
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn require(value: &str, field: &'static str) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        Err(SchemaError::MissingField { field })
    } else {
        Ok(())
    }
}

fn check_unit_schema(unit: &UnitDefinition) -> Result<(), SchemaError> {
    require(&unit.symbol, "unit symbol")?;
    require(&unit.name, "unit name")?;
    for edge in &unit.conversions {
        require(&edge.to_unit, "conversion unit")?;
        if !edge.factor.is_finite() || edge.factor <= 0.0 {
            return Err(SchemaError::invalid(
                "conversion factor",
                "must be greater than zero",
            ));
        }
    }
    Ok(())
}

/// Fixed deposit account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedDepositPayload {
    /// Deposit account number (unique)
    pub account_number: String,
    /// Bank holding the deposit
    pub bank_name: String,
    /// Branch, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Principal in minor currency units
    pub principal_minor: u64,
    /// Annual interest rate
    pub interest_rate_percent: f64,
    /// Date the deposit was placed
    pub deposit_date: NaiveDate,
    /// Date the deposit matures
    pub maturity_date: NaiveDate,
}

impl FixedDepositPayload {
    fn check_schema(&self) -> Result<(), SchemaError> {
        require(&self.account_number, "account number")?;
        require(&self.bank_name, "bank name")?;
        if self.principal_minor == 0 {
            return Err(SchemaError::invalid("principal", "must be greater than zero"));
        }
        if !(self.interest_rate_percent > 0.0 && self.interest_rate_percent <= 100.0) {
            return Err(SchemaError::invalid(
                "interest rate",
                "must be between 0 and 100",
            ));
        }
        if self.maturity_date <= self.deposit_date {
            return Err(SchemaError::invalid(
                "maturity date",
                "must be after the deposit date",
            ));
        }
        Ok(())
    }
}

/// HSN (goods) or SAC (services) classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HsnKind {
    /// Harmonized System of Nomenclature (goods)
    Hsn,
    /// Services Accounting Code
    Sac,
}

/// HSN/SAC tax code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HsnPayload {
    /// Numeric code (unique)
    pub code: String,
    /// HSN or SAC
    pub code_kind: HsnKind,
    /// Description of goods/services covered
    pub description: String,
    /// GST rate
    pub gst_rate_percent: f64,
}

impl HsnPayload {
    /// Create HSN payload
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        code_kind: HsnKind,
        description: impl Into<String>,
        gst_rate_percent: f64,
    ) -> Self {
        Self {
            code: code.into(),
            code_kind,
            description: description.into(),
            gst_rate_percent,
        }
    }

    fn check_schema(&self) -> Result<(), SchemaError> {
        require(&self.code, "HSN/SAC code")?;
        require(&self.description, "description")?;
        let code = self.code.trim();
        match self.code_kind {
            HsnKind::Hsn if !HSN_CODE.is_match(code) => {
                return Err(SchemaError::invalid(
                    "HSN code",
                    "must be 2, 4, 6 or 8 digits",
                ));
            }
            HsnKind::Sac if !SAC_CODE.is_match(code) => {
                return Err(SchemaError::invalid(
                    "SAC code",
                    "must be 6 digits starting with 99",
                ));
            }
            _ => {}
        }
        if !(0.0..=100.0).contains(&self.gst_rate_percent) {
            return Err(SchemaError::invalid("GST rate", "must be between 0 and 100"));
        }
        Ok(())
    }
}

/// Inventory base item code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseCodePayload {
    /// Item code (unique)
    pub code: String,
    /// Item name
    pub name: String,
    /// Material or service
    pub item_type: ApplicableType,
    /// Tax classification, if assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsn_code: Option<String>,
    /// Unit the item is primarily measured in
    pub primary_unit: String,
    /// Units the item may be transacted in
    #[serde(default)]
    pub allowed_units: Vec<String>,
}

impl BaseCodePayload {
    fn check_schema(&self) -> Result<(), SchemaError> {
        require(&self.code, "item code")?;
        require(&self.name, "item name")?;
        require(&self.primary_unit, "primary unit")?;
        if self.allowed_units.iter().any(|u| u.trim().is_empty()) {
            return Err(SchemaError::invalid("allowed units", "contains a blank unit"));
        }
        Ok(())
    }

    fn normalize_units(&mut self) {
        self.code = normalize(&self.code);
        self.primary_unit = UnitSymbol::normalize(&self.primary_unit);
        let mut allowed = vec![self.primary_unit.clone()];
        for unit in &self.allowed_units {
            let unit = UnitSymbol::normalize(unit);
            if !unit.is_empty() && !allowed.contains(&unit) {
                allowed.push(unit);
            }
        }
        self.allowed_units = allowed;
    }
}

/// Specification under a base item code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationPayload {
    /// Parent base item code
    pub base_code: String,
    /// Specification code, unique per base code
    pub spec_code: String,
    /// Free-text description
    pub description: String,
    /// Named attributes (grade, size, finish, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl SpecificationPayload {
    fn check_schema(&self) -> Result<(), SchemaError> {
        require(&self.base_code, "base item code")?;
        require(&self.spec_code, "specification code")?;
        require(&self.description, "description")?;
        if self.attributes.keys().any(|k| k.trim().is_empty()) {
            return Err(SchemaError::invalid("attributes", "attribute names cannot be blank"));
        }
        Ok(())
    }
}

/// Purchase order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoLineItem {
    /// Ordered item code
    pub item_code: String,
    /// Ordered quantity
    pub quantity: f64,
    /// Unit the quantity is expressed in
    pub unit: String,
}

/// Client purchase order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPoPayload {
    /// PO number, unique per client
    pub po_number: String,
    /// Issuing client
    pub client_name: String,
    /// PO date
    pub po_date: NaiveDate,
    /// Ordered lines
    pub line_items: Vec<PoLineItem>,
}

impl ClientPoPayload {
    fn check_schema(&self) -> Result<(), SchemaError> {
        require(&self.po_number, "PO number")?;
        require(&self.client_name, "client name")?;
        if self.line_items.is_empty() {
            return Err(SchemaError::MissingField { field: "line items" });
        }
        for line in &self.line_items {
            require(&line.item_code, "line item code")?;
            require(&line.unit, "line item unit")?;
            if !line.quantity.is_finite() || line.quantity <= 0.0 {
                return Err(SchemaError::invalid("quantity", "must be greater than zero"));
            }
        }
        Ok(())
    }
}
