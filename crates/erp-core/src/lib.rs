//! ERP Core
//!
//! Application layer over the entity store, unit model, workflow engine and
//! verification queues.
//!
//! # Overview
//!
//! - **ErpConfig**: TOML configuration (routing, unit seed, policies)
//! - **ErpService**: the composed service, passed explicitly to handlers
//! - **ApiGateway**: authenticated boundary contracts with the response envelope
//! - **submit_bulk**: all-or-nothing spreadsheet ingestion under one batch
//! - **reduce**: pure client-state reducer for verification screens
//!
//! # Example
//!
//! ```rust
//! use erp_core::{ErpConfig, ErpService};
//! use erp_units::{UnitDefinition, UnitType};
//!
//! let config = ErpConfig::new()
//!     .with_seed_unit(UnitDefinition::new("KG", "Kilogram", UnitType::Weight).base())
//!     .with_seed_unit(UnitDefinition::new("MT", "Metric Tonne", UnitType::Weight).convert_to("KG", 1000.0));
//! let service = ErpService::new(&config).unwrap();
//!
//! assert_eq!(service.convert("MT", "KG", 2.0).unwrap(), 2000.0);
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod bulk;
pub mod config;
pub mod error;
pub mod service;
pub mod state;
pub mod unit_rules;

// Re-exports
pub use api::{
    ApiErrorBody, ApiGateway, ApiResponse, BatchDecisionRequest, BatchMetadata, BatchResultLists,
    BatchResults, BearerToken, DecisionRequest, SubmitPayload, SubmitRequest, Submitted,
    VerificationListRequest, VerificationListing,
};
pub use bulk::{BulkReceipt, BulkUpload};
pub use config::{ErpConfig, LoggingConfig, UnitsConfig};
pub use error::{ErpError, RowError};
pub use service::ErpService;
pub use state::{reduce, AppEvent, AppState, RequestId};
pub use unit_rules::{UnitReferenceValidator, UnitRegistration};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    //! Common imports for working with the ERP service
    pub use crate::{ApiGateway, BearerToken, BulkUpload, ErpConfig, ErpError, ErpService};
    pub use erp_store::{BatchId, Entity, EntityId, EntityKind, EntityPayload, EntityStatus, RoleId};
    pub use erp_units::{UnitDefinition, UnitType};
}
