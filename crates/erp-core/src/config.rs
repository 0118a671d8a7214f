//! Service configuration
//!
//! Loaded from TOML. Every section is optional:
//!
//! ```toml
//! [workflow]
//! enforce_routing = true
//!
//! [units]
//! reciprocal_conversions = false
//!
//! [[units.seed]]
//! symbol = "KG"
//! name = "Kilogram"
//! unitType = "WEIGHT"
//! isBaseUnit = true
//!
//! [routing]
//! HSN = ["TAX_REVIEWER", "GST_OFFICER"]
//!
//! [logging]
//! filter = "info,erp_workflow=debug"
//! ```
//!
//! Seed units are registered before any submission and skip the workflow.
//! Routing entries replace the built-in reviewers for the listed kinds only.

use crate::error::ErpError;
use erp_store::EntityKind;
use erp_units::{ConversionPolicy, UnitDefinition};
use erp_workflow::{RoutingTable, WorkflowConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    /// Workflow engine settings
    pub workflow: WorkflowConfig,
    /// Unit registry settings
    pub units: UnitsConfig,
    /// Entity kind -> reviewer roles overrides
    pub routing: BTreeMap<String, Vec<String>>,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// `[units]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    /// Derive `1 / factor` when only the opposite edge exists
    pub reciprocal_conversions: bool,
    /// Pre-approved units
    pub seed: Vec<UnitDefinition>,
}

impl UnitsConfig {
    /// Conversion policy selected by this section
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ConversionPolicy {
        if self.reciprocal_conversions {
            ConversionPolicy::Reciprocal
        } else {
            ConversionPolicy::Directional
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl ErpConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    /// `ErpError::Config` on malformed TOML or unknown routing kinds
    pub fn from_toml_str(raw: &str) -> Result<Self, ErpError> {
        let config: Self = toml::from_str(raw).map_err(|e| ErpError::Config(e.to_string()))?;
        config.routing_table()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `ErpError::Config` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ErpError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ErpError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            seed_units = config.units.seed.len(),
            routing_overrides = config.routing.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// With routing enforcement toggled
    #[inline]
    #[must_use]
    pub fn with_enforce_routing(mut self, enforce: bool) -> Self {
        self.workflow.enforce_routing = enforce;
        self
    }

    /// With reciprocal conversions toggled
    #[inline]
    #[must_use]
    pub fn with_reciprocal_conversions(mut self, reciprocal: bool) -> Self {
        self.units.reciprocal_conversions = reciprocal;
        self
    }

    /// With an additional seed unit
    #[inline]
    #[must_use]
    pub fn with_seed_unit(mut self, unit: UnitDefinition) -> Self {
        self.units.seed.push(unit);
        self
    }

    /// With reviewer roles for one kind
    #[must_use]
    pub fn with_route<I, R>(mut self, kind: EntityKind, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.routing
            .insert(kind.as_str().to_string(), roles.into_iter().map(Into::into).collect());
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.logging.filter = filter.into();
        self
    }

    /// Built-in routes with this configuration's overrides applied
    ///
    /// # Errors
    /// `ErpError::Config` for unknown kinds or an override without roles
    pub fn routing_table(&self) -> Result<RoutingTable, ErpError> {
        let mut table = RoutingTable::with_defaults();
        for (raw_kind, roles) in &self.routing {
            let kind: EntityKind = raw_kind.parse().map_err(ErpError::Config)?;
            if roles.iter().all(|r| r.trim().is_empty()) {
                return Err(ErpError::Config(format!("routing for {kind} lists no roles")));
            }
            table.set_routes(kind, roles.iter().filter(|r| !r.trim().is_empty()).map(String::as_str));
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_store::RoleId;
    use erp_units::UnitType;

    #[test]
    fn empty_toml_is_default() {
        let config = ErpConfig::from_toml_str("").unwrap();
        assert_eq!(config, ErpConfig::default());
        assert!(config.workflow.enforce_routing);
        assert_eq!(config.units.policy(), ConversionPolicy::Directional);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn parses_every_section() {
        let raw = r#"
            [workflow]
            enforce_routing = false

            [units]
            reciprocal_conversions = true

            [[units.seed]]
            symbol = "kg"
            name = "Kilogram"
            unitType = "WEIGHT"
            isBaseUnit = true

            [[units.seed]]
            symbol = "g"
            name = "Gram"
            unitType = "WEIGHT"
            conversions = [{ toUnit = "KG", factor = 0.001 }]

            [routing]
            hsn = ["gst_officer"]

            [logging]
            filter = "debug"
        "#;
        let config = ErpConfig::from_toml_str(raw).unwrap();

        assert!(!config.workflow.enforce_routing);
        assert_eq!(config.units.policy(), ConversionPolicy::Reciprocal);
        assert_eq!(config.units.seed.len(), 2);
        assert_eq!(config.units.seed[1].unit_type, UnitType::Weight);
        assert_eq!(config.units.seed[1].conversions[0].factor, 0.001);

        let table = config.routing_table().unwrap();
        assert!(table.may_review(EntityKind::HsnCode, &RoleId::new("GST_OFFICER")));
        assert!(!table.may_review(EntityKind::HsnCode, &RoleId::new("TAX_REVIEWER")));
        assert!(table.may_review(EntityKind::Unit, &RoleId::new("MASTER_DATA_REVIEWER")));
    }

    #[test]
    fn unknown_routing_kind_rejected() {
        let err = ErpConfig::from_toml_str("[routing]\ninvoice = [\"X\"]").unwrap_err();
        assert!(matches!(err, ErpError::Config(ref msg) if msg.contains("invoice")));
    }

    #[test]
    fn empty_route_rejected() {
        let config = ErpConfig::new().with_route(EntityKind::Unit, [" "]);
        assert!(config.routing_table().is_err());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(
            ErpConfig::from_toml_str("[workflow\nenforce_routing = 1"),
            Err(ErpError::Config(_))
        ));
    }
}
