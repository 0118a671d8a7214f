//! ERP Approval Workflow
//!
//! One state machine for every entity type:
//! `Draft -> PendingVerification -> {Approved | Rejected}`.
//!
//! # Overview
//!
//! - **WorkflowEngine**: submit, approve, reject and their batch variants
//! - **RoutingTable**: which reviewer roles decide which entity kinds
//! - **PayloadValidator**: submission-time payload checks
//! - **ApprovalEffect**: downstream side effects of approval
//! - **AuditLog**: hash-chained record of every transition
//!
//! # Example
//!
//! ```rust
//! use erp_store::{EntityPayload, EntityStatus, HsnKind, HsnPayload, InMemoryStore, RoleId};
//! use erp_workflow::{RoutingTable, WorkflowEngine};
//! use std::sync::Arc;
//!
//! let engine = WorkflowEngine::new(Arc::new(InMemoryStore::new()), RoutingTable::with_defaults());
//! let payload = EntityPayload::HsnCode(HsnPayload::new("8471", HsnKind::Hsn, "Computers", 18.0));
//!
//! let entity = engine.submit(payload, &RoleId::new("clerk"), None).unwrap();
//! let approved = engine.approve(entity.id, &RoleId::new("TAX_REVIEWER"), "rate verified").unwrap();
//! assert_eq!(approved.status, EntityStatus::Approved);
//! ```

#![warn(missing_docs)]

pub mod audit;
pub mod batch;
pub mod effects;
pub mod engine;
pub mod error;
pub mod routing;
pub mod state_machine;
pub mod validation;

// Re-exports
pub use audit::{AuditError, AuditEvent, AuditEventId, AuditLog};
pub use batch::{BatchFailure, BatchOutcome};
pub use effects::ApprovalEffect;
pub use engine::{WorkflowConfig, WorkflowEngine};
pub use error::{StateError, ValidationError, WorkflowError};
pub use routing::RoutingTable;
pub use validation::{validate_remarks, PayloadValidator, SchemaValidator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if running with strict debugging enabled
pub const fn strict_debug() -> bool {
    cfg!(feature = "strict-debug")
}
