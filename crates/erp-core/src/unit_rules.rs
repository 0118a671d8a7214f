//! Unit-aware workflow hooks
//!
//! [`UnitReferenceValidator`] checks payloads that reference units against
//! the registry at submission time. [`UnitRegistration`] makes an approved
//! unit entity usable in conversions.

use erp_store::{BaseCodePayload, Entity, EntityKind, EntityPayload};
use erp_units::{UnitError, UnitRegistry};
use erp_workflow::{ApprovalEffect, PayloadValidator, ValidationError};
use std::sync::Arc;

fn rejected(err: UnitError) -> ValidationError {
    ValidationError::invalid(err.to_string())
}

/// Cross-references unit symbols in payloads with the registry
#[derive(Debug, Clone)]
pub struct UnitReferenceValidator {
    units: Arc<UnitRegistry>,
}

impl UnitReferenceValidator {
    /// Create validator over a registry
    #[inline]
    #[must_use]
    pub fn new(units: Arc<UnitRegistry>) -> Self {
        Self { units }
    }

    fn check_base_code(&self, base: &BaseCodePayload) -> Result<(), ValidationError> {
        let primary = self.units.get(&base.primary_unit).map_err(|_| {
            ValidationError::invalid(format!(
                "primary unit {} is not a registered unit",
                base.primary_unit
            ))
        })?;
        if !primary.is_applicable_to(base.item_type) {
            return Err(ValidationError::invalid(format!(
                "unit {} does not apply to {} items",
                primary.symbol, base.item_type
            )));
        }

        for symbol in &base.allowed_units {
            let unit = self.units.get(symbol).map_err(|_| {
                ValidationError::invalid(format!("allowed unit {symbol} is not a registered unit"))
            })?;
            if unit.unit_type != primary.unit_type {
                return Err(ValidationError::invalid(format!(
                    "allowed unit {} is not a {} unit",
                    unit.symbol, primary.unit_type
                )));
            }
        }
        Ok(())
    }
}

impl PayloadValidator for UnitReferenceValidator {
    fn validate(&self, payload: &EntityPayload) -> Result<(), ValidationError> {
        match payload {
            EntityPayload::Unit(def) => self.units.check_candidate(def).map(drop).map_err(rejected),
            EntityPayload::BaseItemCode(base) => self.check_base_code(base),
            EntityPayload::ClientPurchaseOrder(po) => {
                for line in &po.line_items {
                    if !self.units.contains(&line.unit) {
                        return Err(ValidationError::invalid(format!(
                            "line item {}: unit {} is not a registered unit",
                            line.item_code.trim(),
                            line.unit.trim()
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Registers approved unit entities
#[derive(Debug, Clone)]
pub struct UnitRegistration {
    units: Arc<UnitRegistry>,
}

impl UnitRegistration {
    /// Create effect over a registry
    #[inline]
    #[must_use]
    pub fn new(units: Arc<UnitRegistry>) -> Self {
        Self { units }
    }
}

impl ApprovalEffect for UnitRegistration {
    fn applies_to(&self, kind: EntityKind) -> bool {
        kind == EntityKind::Unit
    }

    // The graph may have changed since submission (a competing base unit);
    // the reservation keeps it from changing again before commit
    fn prepare(&self, entity: &Entity) -> Result<(), ValidationError> {
        match &entity.payload {
            EntityPayload::Unit(def) => self.units.reserve(def).map(drop).map_err(rejected),
            _ => Ok(()),
        }
    }

    fn abort(&self, entity: &Entity) {
        if let EntityPayload::Unit(def) = &entity.payload {
            self.units.release(&def.symbol);
        }
    }

    fn commit(&self, entity: &Entity) -> Result<(), String> {
        match &entity.payload {
            EntityPayload::Unit(def) => self
                .units
                .commit_reserved(&def.symbol)
                .map(drop)
                .map_err(|e| e.to_string()),
            _ => Ok(()),
        }
    }
}
