//! ERP Units
//!
//! Measurement units, base-unit designation and conversion factors.
//!
//! # Overview
//!
//! - **Unit**: a measurement unit belonging to one [`UnitType`] family
//! - **UnitRegistry**: the unit graph with conversion and compatibility queries
//! - **preview_conversion**: pure confirmation preview for an unsaved factor
//!
//! # Example
//!
//! ```rust
//! use erp_units::{UnitDefinition, UnitRegistry, UnitType};
//!
//! let registry = UnitRegistry::new();
//! registry
//!     .register_unit(&UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base())
//!     .unwrap();
//! registry
//!     .register_unit(&UnitDefinition::new("G", "Gram", UnitType::Weight).convert_to("KG", 0.001))
//!     .unwrap();
//!
//! let kg = registry.convert("G", "KG", 2500.0).unwrap();
//! assert!((kg - 2.5).abs() < 1e-9);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod preview;
pub mod registry;
pub mod unit;

// Re-exports
pub use error::UnitError;
pub use preview::{preview_conversion, PreviewRow};
pub use registry::{ConversionPolicy, UnitRegistry};
pub use unit::{
    ApplicableType, Conversion, ConversionDefinition, Unit, UnitDefinition, UnitSymbol, UnitType,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
