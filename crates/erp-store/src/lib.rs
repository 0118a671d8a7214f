//! ERP Entity Store
//!
//! Versioned records for every entity that moves through the approval
//! workflow, the per-type payload schemas, and the persistence seam.
//!
//! # Overview
//!
//! - **Entity**: id, status, payload, append-only remarks history
//! - **EntityPayload**: tagged union of the domain payloads
//! - **EntityStore**: persistence trait with atomic status check-and-set
//! - **InMemoryStore**: `DashMap`-backed implementation
//!
//! # Example
//!
//! ```rust
//! use erp_store::{Entity, EntityPayload, EntityStatus, EntityStore, HsnKind, HsnPayload, InMemoryStore, RoleId};
//!
//! let store = InMemoryStore::new();
//! let payload = EntityPayload::HsnCode(HsnPayload::new("8471", HsnKind::Hsn, "Computers", 18.0));
//! let mut entity = Entity::draft(payload, RoleId::new("clerk"), None);
//! entity.status = EntityStatus::PendingVerification;
//!
//! let stored = store.insert(entity).unwrap();
//! assert_eq!(store.get(stored.id).unwrap().sequence, 1);
//! ```

#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod ids;
pub mod memory;
pub mod payload;
pub mod store;

// Re-exports
pub use entity::{Entity, EntityKind, EntityStatus, RemarksEntry, WorkflowAction};
pub use error::{SchemaError, StoreError};
pub use ids::{BatchId, EntityId, RoleId};
pub use memory::InMemoryStore;
pub use payload::{
    BaseCodePayload, ClientPoPayload, EntityPayload, FixedDepositPayload, HsnKind, HsnPayload,
    PoLineItem, SpecificationPayload,
};
pub use store::{EntityFilter, EntityStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
