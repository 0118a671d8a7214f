//! ERP Verification Queues
//!
//! Read-side projection answering "what is waiting for this reviewer".
//! Nothing is cached between calls; every query recomputes from the store.
//!
//! # Example
//!
//! ```rust
//! use erp_queue::VerificationQueue;
//! use erp_store::{EntityKind, InMemoryStore, RoleId};
//! use erp_workflow::RoutingTable;
//!
//! let store = InMemoryStore::new();
//! let routing = RoutingTable::with_defaults();
//! let queue = VerificationQueue::new(&store, &routing);
//!
//! let pending = queue.queue_for(&RoleId::new("TAX_REVIEWER"), EntityKind::HsnCode).unwrap();
//! assert!(pending.is_empty());
//! ```

#![warn(missing_docs)]

pub mod projection;

// Re-exports
pub use projection::{BatchGroup, QueueEntry, QueueMode, VerificationQueue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
