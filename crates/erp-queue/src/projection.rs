//! Verification queue projection
//!
//! Read-only views over the entity store: what a reviewer role still has to
//! decide, listed entity by entity or grouped by upload batch. Nothing is
//! cached, so every call reflects the store as it is.

use erp_store::{BatchId, Entity, EntityFilter, EntityKind, EntityStore, RoleId, StoreError};
use erp_workflow::RoutingTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Listing mode for verification screens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// One row per entity
    #[default]
    Single,
    /// One row per creation batch
    Batch,
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueMode::Single => f.write_str("single"),
            QueueMode::Batch => f.write_str("batch"),
        }
    }
}

impl FromStr for QueueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(QueueMode::Single),
            "batch" => Ok(QueueMode::Batch),
            _ => Err(format!("unknown queue mode: {s}")),
        }
    }
}

/// Pending entity paired with the reviewer it waits on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Pending entity
    pub entity: Entity,
    /// Reviewer role the entity is queued for
    pub reviewer_role_id: RoleId,
}

/// Pending members of one creation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGroup {
    /// Creation batch
    pub batch_id: BatchId,
    /// Pending members, oldest first
    pub entities: Vec<Entity>,
}

impl BatchGroup {
    /// Number of pending members
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the group has no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Verification queue projection over a store and routing table
#[derive(Debug)]
pub struct VerificationQueue<'a, S: EntityStore> {
    store: &'a S,
    routing: &'a RoutingTable,
}

impl<'a, S: EntityStore> VerificationQueue<'a, S> {
    /// Create projection
    #[inline]
    #[must_use]
    pub fn new(store: &'a S, routing: &'a RoutingTable) -> Self {
        Self { store, routing }
    }

    /// Pending entities of `kind` routed to `role`, oldest first
    ///
    /// Empty when `role` does not review `kind`.
    ///
    /// # Errors
    /// `StoreError::Unavailable` if the store cannot be read
    pub fn queue_for(&self, role: &RoleId, kind: EntityKind) -> Result<Vec<Entity>, StoreError> {
        if !self.routing.may_review(kind, role) {
            tracing::debug!(role = %role, kind = %kind, "role not routed for kind");
            return Ok(Vec::new());
        }
        self.store.list(&EntityFilter::pending(kind))
    }

    /// Pending entities across every kind `role` reviews
    ///
    /// Grouped by kind in declaration order, oldest first within a kind.
    ///
    /// # Errors
    /// `StoreError::Unavailable` if the store cannot be read
    pub fn entries_for(&self, role: &RoleId) -> Result<Vec<QueueEntry>, StoreError> {
        let mut entries = Vec::new();
        for kind in self.routing.kinds_for(role) {
            entries.extend(self.queue_for(role, kind)?.into_iter().map(|entity| QueueEntry {
                entity,
                reviewer_role_id: role.clone(),
            }));
        }
        Ok(entries)
    }

    /// Batch-mode listing of pending entities of `kind`
    ///
    /// Entities without a creation batch are left out. Groups are ordered by
    /// their oldest pending member.
    ///
    /// # Errors
    /// `StoreError::Unavailable` if the store cannot be read
    pub fn batches_for(&self, role: &RoleId, kind: EntityKind) -> Result<Vec<BatchGroup>, StoreError> {
        let mut groups: Vec<BatchGroup> = Vec::new();
        let mut index: HashMap<BatchId, usize> = HashMap::new();

        // Input is already in submission order
        for entity in self.queue_for(role, kind)? {
            let Some(batch_id) = entity.creation_batch_id else {
                continue;
            };
            let slot = *index.entry(batch_id).or_insert_with(|| {
                groups.push(BatchGroup {
                    batch_id,
                    entities: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].entities.push(entity);
        }
        Ok(groups)
    }

    /// Number of pending entities awaiting `role`
    ///
    /// # Errors
    /// `StoreError::Unavailable` if the store cannot be read
    pub fn pending_count(&self, role: &RoleId) -> Result<usize, StoreError> {
        self.routing
            .kinds_for(role)
            .into_iter()
            .map(|kind| self.queue_for(role, kind).map(|queue| queue.len()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_store::{EntityPayload, EntityStatus, HsnKind, HsnPayload, InMemoryStore, RemarksEntry};

    fn pending(store: &InMemoryStore, code: &str, batch: Option<BatchId>) -> Entity {
        let payload = EntityPayload::HsnCode(HsnPayload::new(code, HsnKind::Hsn, "Goods", 5.0));
        let mut entity = Entity::draft(payload, RoleId::new("clerk"), batch);
        entity.status = EntityStatus::PendingVerification;
        store.insert(entity).unwrap()
    }

    #[test]
    fn unrouted_role_sees_nothing() {
        let store = InMemoryStore::new();
        let routing = RoutingTable::with_defaults();
        pending(&store, "8471", None);

        let queue = VerificationQueue::new(&store, &routing);
        let sales = RoleId::new("SALES_REVIEWER");
        assert!(queue.queue_for(&sales, EntityKind::HsnCode).unwrap().is_empty());
        assert_eq!(queue.pending_count(&sales).unwrap(), 0);
        assert_eq!(queue.pending_count(&RoleId::new("TAX_REVIEWER")).unwrap(), 1);
    }

    #[test]
    fn batches_group_in_submission_order() {
        let store = InMemoryStore::new();
        let routing = RoutingTable::with_defaults();
        let early = BatchId::new();
        let late = BatchId::new();
        let a = pending(&store, "8401", Some(early));
        pending(&store, "8402", None);
        let b = pending(&store, "8403", Some(late));
        let c = pending(&store, "8404", Some(early));

        let queue = VerificationQueue::new(&store, &routing);
        let groups = queue.batches_for(&RoleId::new("TAX_REVIEWER"), EntityKind::HsnCode).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].batch_id, early);
        assert_eq!(groups[0].entities.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a.id, c.id]);
        assert_eq!(groups[1].batch_id, late);
        assert_eq!(groups[1].entities[0].id, b.id);
    }

    #[test]
    fn decided_members_drop_out_of_groups() {
        let store = InMemoryStore::new();
        let routing = RoutingTable::with_defaults();
        let batch = BatchId::new();
        let only = pending(&store, "8401", Some(batch));
        store
            .transition(
                only.id,
                EntityStatus::PendingVerification,
                EntityStatus::Approved,
                RemarksEntry::now(RoleId::new("TAX_REVIEWER"), erp_store::WorkflowAction::Approved, "ok"),
            )
            .unwrap();

        let queue = VerificationQueue::new(&store, &routing);
        assert!(queue.batches_for(&RoleId::new("ADMIN"), EntityKind::HsnCode).unwrap().is_empty());
    }

    #[test]
    fn queue_mode_parses() {
        assert_eq!("Batch".parse::<QueueMode>().unwrap(), QueueMode::Batch);
        assert_eq!(QueueMode::default(), QueueMode::Single);
        assert!("paged".parse::<QueueMode>().is_err());
    }
}
