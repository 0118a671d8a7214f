//! Unit registry
//!
//! Provides [`UnitRegistry`], the measurement-unit graph. Units are keyed by
//! normalized symbol and kept in registration order. Only registered units
//! take part in conversions.
//!
//! A unit can also be reserved: it then holds its symbol and, for base units,
//! its family's base slot against every other registration or reservation
//! until it is committed or released.

use crate::error::UnitError;
use crate::unit::{ApplicableType, Conversion, Unit, UnitDefinition, UnitSymbol, UnitType};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How conversion factors are interpreted when no direct edge exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPolicy {
    /// Only edges as entered (plus the base-unit route)
    #[default]
    Directional,
    /// Also use `1 / factor` of the opposite edge
    Reciprocal,
}

/// Thread-safe unit graph
#[derive(Debug, Default)]
pub struct UnitRegistry {
    policy: ConversionPolicy,
    units: RwLock<IndexMap<UnitSymbol, Unit>>,
    // Locked after `units`, never before
    reserved: Mutex<IndexMap<UnitSymbol, Unit>>,
}

impl UnitRegistry {
    /// Create empty registry with directional conversions
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty registry with the given policy
    #[inline]
    #[must_use]
    pub fn with_policy(policy: ConversionPolicy) -> Self {
        Self {
            policy,
            units: RwLock::new(IndexMap::new()),
            reserved: Mutex::new(IndexMap::new()),
        }
    }

    /// Active conversion policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ConversionPolicy {
        self.policy
    }

    /// Register a unit
    ///
    /// # Errors
    /// `UnitError::Validation` if the symbol is taken, a second base unit is
    /// declared for the type, or any conversion edge is invalid
    pub fn register_unit(&self, def: &UnitDefinition) -> Result<Unit, UnitError> {
        let mut units = self.units.write();
        let reserved = self.reserved.lock();
        let unit = validate(&units, &reserved, def)?;
        drop(reserved);
        units.insert(unit.symbol.clone(), unit.clone());
        drop(units);

        tracing::info!(
            symbol = %unit.symbol,
            unit_type = %unit.unit_type,
            base = unit.is_base_unit,
            "registered unit"
        );
        Ok(unit)
    }

    /// Validate a definition against the current graph without registering it
    ///
    /// # Errors
    /// Same as [`UnitRegistry::register_unit`]
    pub fn check_candidate(&self, def: &UnitDefinition) -> Result<Unit, UnitError> {
        let units = self.units.read();
        validate(&units, &self.reserved.lock(), def)
    }

    /// Validate and hold a definition without making it usable
    ///
    /// # Errors
    /// Same as [`UnitRegistry::register_unit`]; a held reservation counts as
    /// a registered unit
    pub fn reserve(&self, def: &UnitDefinition) -> Result<Unit, UnitError> {
        let units = self.units.read();
        let mut reserved = self.reserved.lock();
        let unit = validate(&units, &reserved, def)?;
        reserved.insert(unit.symbol.clone(), unit.clone());
        tracing::debug!(symbol = %unit.symbol, "reserved unit");
        Ok(unit)
    }

    /// Turn a reservation into a registered unit
    ///
    /// # Errors
    /// `UnitError::Validation` if `symbol` holds no reservation
    pub fn commit_reserved(&self, symbol: &str) -> Result<Unit, UnitError> {
        let mut units = self.units.write();
        let key = UnitSymbol::normalize(symbol);
        let unit = self
            .reserved
            .lock()
            .shift_remove(key.as_str())
            .ok_or_else(|| UnitError::validation(format!("unit {key} is not reserved")))?;
        units.insert(unit.symbol.clone(), unit.clone());
        drop(units);

        tracing::info!(
            symbol = %unit.symbol,
            unit_type = %unit.unit_type,
            base = unit.is_base_unit,
            "registered unit"
        );
        Ok(unit)
    }

    /// Drop a reservation; returns whether one was held
    pub fn release(&self, symbol: &str) -> bool {
        let released = self
            .reserved
            .lock()
            .shift_remove(UnitSymbol::normalize(symbol).as_str())
            .is_some();
        if released {
            tracing::debug!(symbol, "released unit reservation");
        }
        released
    }

    /// Check if symbol is reserved but not yet registered
    #[must_use]
    pub fn is_reserved(&self, symbol: &str) -> bool {
        self.reserved
            .lock()
            .contains_key(UnitSymbol::normalize(symbol).as_str())
    }

    /// Lookup unit by symbol (case-insensitive)
    ///
    /// # Errors
    /// `UnitError::NotFound` for unknown symbols
    pub fn get(&self, symbol: &str) -> Result<Unit, UnitError> {
        let key = UnitSymbol::normalize(symbol);
        self.units
            .read()
            .get(key.as_str())
            .cloned()
            .ok_or(UnitError::NotFound(key))
    }

    /// Check if symbol is registered
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.units
            .read()
            .contains_key(UnitSymbol::normalize(symbol).as_str())
    }

    /// Number of registered units
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Base unit of a family, if one is registered
    #[must_use]
    pub fn base_unit(&self, unit_type: UnitType) -> Option<Unit> {
        self.units
            .read()
            .values()
            .find(|u| u.unit_type == unit_type && u.is_base_unit)
            .cloned()
    }

    /// All units of a family in registration order, optionally excluding one
    #[must_use]
    pub fn units_by_type(&self, unit_type: UnitType, exclude: Option<&str>) -> Vec<Unit> {
        let excluded = exclude.map(UnitSymbol::normalize);
        self.units
            .read()
            .values()
            .filter(|u| u.unit_type == unit_type)
            .filter(|u| excluded.as_deref() != Some(u.symbol.as_str()))
            .cloned()
            .collect()
    }

    /// Units an item with the given primary unit may be measured in
    ///
    /// The primary unit comes first, followed by the rest of its family.
    ///
    /// # Errors
    /// `UnitError::NotFound` if the primary unit is unknown
    pub fn allowed_units_for(&self, primary: &str) -> Result<Vec<Unit>, UnitError> {
        let primary = self.get(primary)?;
        let mut allowed = vec![primary.clone()];
        allowed.extend(self.units_by_type(primary.unit_type, Some(primary.symbol.as_str())));
        Ok(allowed)
    }

    /// Factor `convert` would apply between two units
    ///
    /// # Errors
    /// - `UnitError::NotFound` if either unit is unknown
    /// - `UnitError::Incompatible` if the units share no conversion path
    pub fn factor(&self, from: &str, to: &str) -> Result<f64, UnitError> {
        let units = self.units.read();
        let from_unit = lookup(&units, from)?;
        let to_unit = lookup(&units, to)?;

        if from_unit.unit_type != to_unit.unit_type {
            return Err(UnitError::incompatible(
                from_unit.symbol.as_str(),
                to_unit.symbol.as_str(),
            ));
        }
        if from_unit.symbol == to_unit.symbol {
            return Ok(1.0);
        }
        if let Some(factor) = self.edge(from_unit, to_unit) {
            return Ok(factor);
        }

        // Route through the family's base unit
        let base = units
            .values()
            .find(|u| u.unit_type == from_unit.unit_type && u.is_base_unit);
        let via_base = base.and_then(|base| {
            let from_leg = self.leg_to_base(from_unit, base)?;
            let to_leg = self.leg_to_base(to_unit, base)?;
            Some(from_leg / to_leg)
        });

        via_base.ok_or_else(|| {
            UnitError::incompatible(from_unit.symbol.as_str(), to_unit.symbol.as_str())
        })
    }

    /// Convert an amount between two units
    ///
    /// # Errors
    /// Same as [`UnitRegistry::factor`]
    pub fn convert(&self, from: &str, to: &str, amount: f64) -> Result<f64, UnitError> {
        let factor = self.factor(from, to)?;
        tracing::debug!(from, to, amount, factor, "converted amount");
        Ok(amount * factor)
    }

    /// Direct edge, or its reciprocal under the reciprocal policy
    fn edge(&self, from: &Unit, to: &Unit) -> Option<f64> {
        from.conversion_to(&to.symbol).or_else(|| match self.policy {
            ConversionPolicy::Reciprocal => to.conversion_to(&from.symbol).map(|f| 1.0 / f),
            ConversionPolicy::Directional => None,
        })
    }

    fn leg_to_base(&self, unit: &Unit, base: &Unit) -> Option<f64> {
        if unit.symbol == base.symbol {
            Some(1.0)
        } else {
            self.edge(unit, base)
        }
    }
}

fn lookup<'a>(units: &'a IndexMap<UnitSymbol, Unit>, symbol: &str) -> Result<&'a Unit, UnitError> {
    let key = UnitSymbol::normalize(symbol);
    units.get(key.as_str()).ok_or(UnitError::NotFound(key))
}

fn held<'a>(
    units: &'a IndexMap<UnitSymbol, Unit>,
    reserved: &'a IndexMap<UnitSymbol, Unit>,
    symbol: &UnitSymbol,
) -> Option<&'a Unit> {
    units.get(symbol.as_str()).or_else(|| reserved.get(symbol.as_str()))
}

fn validate(
    units: &IndexMap<UnitSymbol, Unit>,
    reserved: &IndexMap<UnitSymbol, Unit>,
    def: &UnitDefinition,
) -> Result<Unit, UnitError> {
    let symbol = UnitSymbol::new(&def.symbol)?;
    let name = def.name.trim();
    if name.is_empty() {
        return Err(UnitError::validation(format!("unit {symbol}: name is required")));
    }

    // Symbols are unique across every family so conversions stay unambiguous
    if let Some(existing) = held(units, reserved, &symbol) {
        return Err(UnitError::validation(format!(
            "unit symbol {symbol} already exists ({})",
            existing.unit_type
        )));
    }

    if def.is_base_unit {
        if let Some(base) = units
            .values()
            .chain(reserved.values())
            .find(|u| u.unit_type == def.unit_type && u.is_base_unit)
        {
            return Err(UnitError::validation(format!(
                "{} already has base unit {}",
                def.unit_type, base.symbol
            )));
        }
    }

    let mut conversions: Vec<Conversion> = Vec::with_capacity(def.conversions.len());
    for edge in &def.conversions {
        let to_unit = UnitSymbol::new(&edge.to_unit)?;
        if to_unit == symbol {
            return Err(UnitError::validation(format!(
                "unit {symbol} cannot declare a conversion to itself"
            )));
        }
        if !edge.factor.is_finite() || edge.factor <= 0.0 {
            return Err(UnitError::validation(format!(
                "conversion factor {symbol} -> {to_unit} must be greater than zero"
            )));
        }
        if conversions.iter().any(|c| c.to_unit == to_unit) {
            return Err(UnitError::validation(format!(
                "duplicate conversion {symbol} -> {to_unit}"
            )));
        }
        if let Some(target) = held(units, reserved, &to_unit) {
            if target.unit_type != def.unit_type {
                return Err(UnitError::validation(format!(
                    "cannot convert {} unit {symbol} to {} unit {to_unit}",
                    def.unit_type, target.unit_type
                )));
            }
        }
        conversions.push(Conversion {
            to_unit,
            factor: edge.factor,
        });
    }

    let applicable_types: BTreeSet<ApplicableType> = if def.applicable_types.is_empty() {
        [ApplicableType::Material, ApplicableType::Service].into_iter().collect()
    } else {
        def.applicable_types.iter().copied().collect()
    };

    Ok(Unit {
        symbol,
        name: name.to_string(),
        unit_type: def.unit_type,
        is_base_unit: def.is_base_unit,
        applicable_types,
        conversions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_registry(policy: ConversionPolicy) -> UnitRegistry {
        let registry = UnitRegistry::with_policy(policy);
        registry
            .register_unit(&UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base())
            .unwrap();
        registry
            .register_unit(
                &UnitDefinition::new("MT", "Metric Tonne", UnitType::Weight).convert_to("KG", 1000.0),
            )
            .unwrap();
        registry
            .register_unit(&UnitDefinition::new("G", "Gram", UnitType::Weight).convert_to("KG", 0.001))
            .unwrap();
        registry
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn direct_edge_conversion() {
        let registry = UnitRegistry::new();
        registry
            .register_unit(&UnitDefinition::new("KG", "Kilogram", UnitType::Weight).convert_to("MT", 0.001))
            .unwrap();
        registry
            .register_unit(&UnitDefinition::new("MT", "Metric Tonne", UnitType::Weight))
            .unwrap();

        assert_close(registry.convert("KG", "MT", 1000.0).unwrap(), 1.0);
    }

    #[test]
    fn conversion_routes_through_base_unit() {
        let registry = weight_registry(ConversionPolicy::Directional);
        // 1 G = 0.001 KG, 1 MT = 1000 KG
        assert_close(registry.convert("G", "MT", 1_000_000.0).unwrap(), 1.0);
        assert_close(registry.convert("KG", "MT", 500.0).unwrap(), 0.5);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = weight_registry(ConversionPolicy::Directional);
        assert_close(registry.convert("mt", "kg", 2.0).unwrap(), 2000.0);
        assert!(registry.contains("g"));
    }

    #[test]
    fn same_unit_is_identity() {
        let registry = weight_registry(ConversionPolicy::Directional);
        assert_close(registry.convert("G", "G", 42.0).unwrap(), 42.0);
    }

    #[test]
    fn reverse_edge_requires_reciprocal_policy() {
        for (policy, expect_ok) in [
            (ConversionPolicy::Directional, false),
            (ConversionPolicy::Reciprocal, true),
        ] {
            let registry = UnitRegistry::with_policy(policy);
            registry
                .register_unit(&UnitDefinition::new("BOX", "Box", UnitType::Quantity).convert_to("NOS", 12.0))
                .unwrap();
            registry
                .register_unit(&UnitDefinition::new("NOS", "Numbers", UnitType::Quantity))
                .unwrap();

            let result = registry.convert("NOS", "BOX", 24.0);
            if expect_ok {
                assert_close(result.unwrap(), 2.0);
            } else {
                assert!(matches!(result, Err(UnitError::Incompatible { .. })));
            }
        }
    }

    #[test]
    fn different_families_are_incompatible() {
        let registry = weight_registry(ConversionPolicy::Directional);
        registry
            .register_unit(&UnitDefinition::new("M", "Metre", UnitType::Length).base())
            .unwrap();

        let err = registry.convert("KG", "M", 1.0).unwrap_err();
        assert_eq!(err, UnitError::incompatible("KG", "M"));
    }

    #[test]
    fn unknown_unit_not_found() {
        let registry = weight_registry(ConversionPolicy::Directional);
        assert_eq!(
            registry.convert("KG", "LB", 1.0).unwrap_err(),
            UnitError::NotFound("LB".into())
        );
    }

    #[test]
    fn second_base_unit_rejected() {
        let registry = UnitRegistry::new();
        registry
            .register_unit(&UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base())
            .unwrap();

        let result = registry.register_unit(&UnitDefinition::new("MT", "Metric Tonne", UnitType::Weight).base());
        assert!(matches!(result, Err(UnitError::Validation(_))));
        assert!(!registry.contains("MT"));

        // Other families keep their own base unit
        registry
            .register_unit(&UnitDefinition::new("M", "Metre", UnitType::Length).base())
            .unwrap();
    }

    #[test]
    fn duplicate_symbol_rejected_case_insensitively() {
        let registry = weight_registry(ConversionPolicy::Directional);
        let result = registry.register_unit(&UnitDefinition::new("kg", "Kilo", UnitType::Weight));
        assert!(matches!(result, Err(UnitError::Validation(msg)) if msg.contains("already exists")));
    }

    #[test]
    fn invalid_edges_rejected() {
        let registry = weight_registry(ConversionPolicy::Directional);

        let self_edge = UnitDefinition::new("QTL", "Quintal", UnitType::Weight).convert_to("qtl", 1.0);
        assert!(registry.register_unit(&self_edge).is_err());

        for factor in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let def = UnitDefinition::new("QTL", "Quintal", UnitType::Weight).convert_to("KG", factor);
            assert!(registry.register_unit(&def).is_err(), "factor {factor} accepted");
        }

        registry
            .register_unit(&UnitDefinition::new("M", "Metre", UnitType::Length).base())
            .unwrap();
        let cross_family = UnitDefinition::new("QTL", "Quintal", UnitType::Weight).convert_to("M", 2.0);
        assert!(registry.register_unit(&cross_family).is_err());
        assert!(!registry.contains("QTL"));
    }

    #[test]
    fn reservation_holds_base_slot_until_released() {
        let registry = UnitRegistry::new();
        registry
            .reserve(&UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base())
            .unwrap();
        assert!(registry.is_reserved("kg"));
        assert!(!registry.contains("KG"));

        let rival = UnitDefinition::new("LB", "Pound", UnitType::Weight).base();
        assert!(registry.reserve(&rival).is_err());
        assert!(registry.register_unit(&rival).is_err());
        assert!(registry
            .check_candidate(&UnitDefinition::new("kg", "Kilo", UnitType::Weight))
            .is_err());

        assert!(registry.release("KG"));
        assert!(!registry.release("KG"));
        registry.register_unit(&rival).unwrap();
    }

    #[test]
    fn committed_reservation_converts() {
        let registry = UnitRegistry::new();
        registry
            .reserve(&UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base())
            .unwrap();
        assert!(matches!(registry.convert("KG", "KG", 1.0), Err(UnitError::NotFound(_))));

        let unit = registry.commit_reserved("kg").unwrap();
        assert!(unit.is_base_unit);
        assert!(!registry.is_reserved("KG"));
        registry
            .register_unit(&UnitDefinition::new("G", "Gram", UnitType::Weight).convert_to("KG", 0.001))
            .unwrap();
        assert_close(registry.convert("G", "KG", 500.0).unwrap(), 0.5);
        assert!(registry.commit_reserved("KG").is_err());
    }

    #[test]
    fn check_candidate_does_not_register() {
        let registry = weight_registry(ConversionPolicy::Directional);
        let def = UnitDefinition::new("QTL", "Quintal", UnitType::Weight).convert_to("KG", 100.0);
        registry.check_candidate(&def).unwrap();
        assert!(!registry.contains("QTL"));
    }

    #[test]
    fn allowed_units_include_primary_first() {
        let registry = weight_registry(ConversionPolicy::Directional);
        registry
            .register_unit(&UnitDefinition::new("M", "Metre", UnitType::Length).base())
            .unwrap();

        let allowed = registry.allowed_units_for("g").unwrap();
        let symbols: Vec<&str> = allowed.iter().map(|u| u.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["G", "KG", "MT"]);
    }

    #[test]
    fn units_by_type_excludes_requested_unit() {
        let registry = weight_registry(ConversionPolicy::Directional);
        let units = registry.units_by_type(UnitType::Weight, Some("kg"));
        let symbols: Vec<&str> = units.iter().map(|u| u.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MT", "G"]);
        assert!(registry.units_by_type(UnitType::Area, None).is_empty());
    }

    #[test]
    fn empty_applicable_types_means_both() {
        let registry = weight_registry(ConversionPolicy::Directional);
        let kg = registry.get("KG").unwrap();
        assert!(kg.is_applicable_to(ApplicableType::Material));
        assert!(kg.is_applicable_to(ApplicableType::Service));
    }
}
