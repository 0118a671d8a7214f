//! Persistence seam
//!
//! The workflow engine only talks to [`EntityStore`]. Implementations must
//! make `transition` an atomic check-and-set keyed by entity id so that two
//! reviewers racing on the same entity cannot both succeed.

use crate::entity::{Entity, EntityKind, EntityStatus, RemarksEntry};
use crate::error::StoreError;
use crate::ids::{BatchId, EntityId};

/// Filter for [`EntityStore::list`]; `None` fields match everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityFilter {
    /// Restrict to one entity kind
    pub kind: Option<EntityKind>,
    /// Restrict to one status
    pub status: Option<EntityStatus>,
    /// Restrict to one creation batch
    pub batch_id: Option<BatchId>,
}

impl EntityFilter {
    /// Match everything
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Pending entities of a kind
    #[inline]
    #[must_use]
    pub fn pending(kind: EntityKind) -> Self {
        Self {
            kind: Some(kind),
            status: Some(EntityStatus::PendingVerification),
            batch_id: None,
        }
    }

    /// Members of a batch
    #[inline]
    #[must_use]
    pub fn batch(batch_id: BatchId) -> Self {
        Self {
            batch_id: Some(batch_id),
            ..Self::default()
        }
    }

    /// With kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the entity passes the filter
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        self.kind.map_or(true, |k| entity.kind == k)
            && self.status.map_or(true, |s| entity.status == s)
            && self
                .batch_id
                .map_or(true, |b| entity.creation_batch_id == Some(b))
    }
}

/// Entity persistence
pub trait EntityStore: Send + Sync {
    /// Persist a new entity, assigning its sequence number
    ///
    /// # Errors
    /// `StoreError::Duplicate` if an active entity of the same kind holds the
    /// same unique key
    fn insert(&self, entity: Entity) -> Result<Entity, StoreError>;

    /// Persist several entities, all or none
    ///
    /// # Errors
    /// `StoreError::Duplicate` for the first key already held (or repeated
    /// within `entities`); nothing is stored in that case
    fn insert_all(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, StoreError>;

    /// Fetch entity by id
    ///
    /// # Errors
    /// `StoreError::NotFound`
    fn get(&self, id: EntityId) -> Result<Entity, StoreError>;

    /// Atomically move `id` from `expected` to `next`, appending `entry`
    ///
    /// # Errors
    /// - `StoreError::NotFound`
    /// - `StoreError::StatusConflict` if the stored status is not `expected`
    fn transition(
        &self,
        id: EntityId,
        expected: EntityStatus,
        next: EntityStatus,
        entry: RemarksEntry,
    ) -> Result<Entity, StoreError>;

    /// Entities matching `filter`, ordered by submission time then sequence
    ///
    /// # Errors
    /// `StoreError::Unavailable` if the backend cannot be read
    fn list(&self, filter: &EntityFilter) -> Result<Vec<Entity>, StoreError>;

    /// Whether an active entity of `kind` holds `key`
    ///
    /// # Errors
    /// `StoreError::Unavailable` if the backend cannot be read
    fn contains_key(&self, kind: EntityKind, key: &str) -> Result<bool, StoreError>;
}
