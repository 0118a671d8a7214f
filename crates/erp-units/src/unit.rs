//! Unit types
//!
//! [`UnitDefinition`] is the unvalidated input shape (unit payloads, config
//! seeds); [`Unit`] is what the registry hands out after validation.

use crate::error::UnitError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Measurement family a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    /// Mass (KG, G, MT)
    Weight,
    /// Distance (M, CM, KM)
    Length,
    /// Capacity (L, ML)
    Volume,
    /// Countable (NOS, DOZ)
    Quantity,
    /// Surface (SQM, SQFT)
    Area,
    /// Duration (HR, DAY)
    Time,
    /// Lump-sum billing
    Lumpsum,
}

impl UnitType {
    /// All unit families in declaration order
    pub const ALL: [UnitType; 7] = [
        UnitType::Weight,
        UnitType::Length,
        UnitType::Volume,
        UnitType::Quantity,
        UnitType::Area,
        UnitType::Time,
        UnitType::Lumpsum,
    ];

    /// Canonical upper-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnitType::Weight => "WEIGHT",
            UnitType::Length => "LENGTH",
            UnitType::Volume => "VOLUME",
            UnitType::Quantity => "QUANTITY",
            UnitType::Area => "AREA",
            UnitType::Time => "TIME",
            UnitType::Lumpsum => "LUMPSUM",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| UnitError::validation(format!("unknown unit type: {s}")))
    }
}

/// Item category a unit may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicableType {
    /// Physical goods
    Material,
    /// Services
    Service,
}

impl ApplicableType {
    /// Canonical upper-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicableType::Material => "MATERIAL",
            ApplicableType::Service => "SERVICE",
        }
    }
}

impl fmt::Display for ApplicableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicableType {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MATERIAL" => Ok(ApplicableType::Material),
            "SERVICE" => Ok(ApplicableType::Service),
            _ => Err(UnitError::validation(format!("unknown applicable type: {s}"))),
        }
    }
}

/// Case-normalized unit symbol (trimmed, upper-case, non-empty)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitSymbol(String);

impl UnitSymbol {
    /// Normalize a raw symbol
    ///
    /// # Errors
    /// `UnitError::Validation` if the symbol is blank
    pub fn new(raw: &str) -> Result<Self, UnitError> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Err(UnitError::validation("unit symbol is required"));
        }
        Ok(Self(normalized))
    }

    /// Normalized form of `raw` without validation
    #[inline]
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    /// Symbol as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UnitSymbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UnitSymbol {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<UnitSymbol> for String {
    fn from(value: UnitSymbol) -> Self {
        value.0
    }
}

/// Directed conversion edge: `1 self = factor * to_unit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// Target unit
    pub to_unit: UnitSymbol,
    /// Multiplier, always finite and positive
    pub factor: f64,
}

/// Conversion edge as entered, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionDefinition {
    /// Target unit symbol (any case)
    pub to_unit: String,
    /// Multiplier
    pub factor: f64,
}

/// Unit registration input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDefinition {
    /// Short identifier, case-insensitive
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Measurement family
    pub unit_type: UnitType,
    /// Whether this is the reference unit of its family
    #[serde(default)]
    pub is_base_unit: bool,
    /// Item categories the unit applies to (empty means both)
    #[serde(default)]
    pub applicable_types: Vec<ApplicableType>,
    /// Outgoing conversion edges
    #[serde(default)]
    pub conversions: Vec<ConversionDefinition>,
}

impl UnitDefinition {
    /// Create definition without conversions
    #[must_use]
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, unit_type: UnitType) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            unit_type,
            is_base_unit: false,
            applicable_types: Vec::new(),
            conversions: Vec::new(),
        }
    }

    /// Mark as base unit
    #[inline]
    #[must_use]
    pub fn base(mut self) -> Self {
        self.is_base_unit = true;
        self
    }

    /// Add conversion edge
    #[inline]
    #[must_use]
    pub fn convert_to(mut self, to_unit: impl Into<String>, factor: f64) -> Self {
        self.conversions.push(ConversionDefinition {
            to_unit: to_unit.into(),
            factor,
        });
        self
    }

    /// Restrict to item categories
    #[inline]
    #[must_use]
    pub fn applicable_to(mut self, types: &[ApplicableType]) -> Self {
        self.applicable_types = types.to_vec();
        self
    }
}

/// Registered unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Normalized symbol
    pub symbol: UnitSymbol,
    /// Display name
    pub name: String,
    /// Measurement family
    pub unit_type: UnitType,
    /// Reference unit of its family
    pub is_base_unit: bool,
    /// Item categories the unit applies to
    pub applicable_types: BTreeSet<ApplicableType>,
    /// Outgoing conversion edges
    pub conversions: Vec<Conversion>,
}

impl Unit {
    /// Factor of the direct edge `self -> to`, if declared
    #[must_use]
    pub fn conversion_to(&self, to: &UnitSymbol) -> Option<f64> {
        self.conversions
            .iter()
            .find(|c| &c.to_unit == to)
            .map(|c| c.factor)
    }

    /// Whether the unit may be used for the given item category
    #[inline]
    #[must_use]
    pub fn is_applicable_to(&self, item_type: ApplicableType) -> bool {
        self.applicable_types.contains(&item_type)
    }
}
