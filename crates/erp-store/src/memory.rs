//! In-memory entity store
//!
//! Provides [`InMemoryStore`] backed by `DashMap`. Status check-and-set runs
//! under the entry's shard lock; the unique-key index is a second map keyed
//! by `(kind, key)`.

use crate::entity::{Entity, EntityKind, EntityStatus, RemarksEntry};
use crate::error::StoreError;
use crate::ids::EntityId;
use crate::store::{EntityFilter, EntityStore};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Records by id
    entities: DashMap<EntityId, Entity>,

    /// Unique-key index over active entities
    keys: DashMap<(EntityKind, String), EntityId>,

    /// Last assigned sequence number
    sequence: AtomicU64,
}

impl InMemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities (all statuses)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityStore for InMemoryStore {
    fn insert(&self, mut entity: Entity) -> Result<Entity, StoreError> {
        let key = entity.payload.unique_key();

        match self.keys.entry((entity.kind, key.clone())) {
            Entry::Occupied(_) => {
                return Err(StoreError::Duplicate {
                    kind: entity.kind,
                    key,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(entity.id);
            }
        }

        entity.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.entities.insert(entity.id, entity.clone());

        tracing::debug!(id = %entity.id, kind = %entity.kind, key = %key, "stored entity");
        Ok(entity)
    }

    fn insert_all(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, StoreError> {
        // Claim every key before any record becomes visible
        let mut claimed: Vec<((EntityKind, String), EntityId)> = Vec::with_capacity(entities.len());
        for entity in &entities {
            let key = (entity.kind, entity.payload.unique_key());
            let vacant = match self.keys.entry(key.clone()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(entity.id);
                    true
                }
            };
            if !vacant {
                for (held, id) in &claimed {
                    self.keys.remove_if(held, |_, holder| holder == id);
                }
                return Err(StoreError::Duplicate {
                    kind: key.0,
                    key: key.1,
                });
            }
            claimed.push((key, entity.id));
        }

        let stored: Vec<Entity> = entities
            .into_iter()
            .map(|mut entity| {
                entity.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                self.entities.insert(entity.id, entity.clone());
                entity
            })
            .collect();

        tracing::debug!(count = stored.len(), "stored entities");
        Ok(stored)
    }

    fn get(&self, id: EntityId) -> Result<Entity, StoreError> {
        self.entities
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn transition(
        &self,
        id: EntityId,
        expected: EntityStatus,
        next: EntityStatus,
        entry: RemarksEntry,
    ) -> Result<Entity, StoreError> {
        let mut slot = self.entities.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if slot.status != expected {
            return Err(StoreError::StatusConflict {
                id,
                expected,
                actual: slot.status,
            });
        }

        slot.status = next;
        slot.remarks_history.push(entry);
        slot.version += 1;
        let updated = slot.clone();
        drop(slot);

        // Rejected records stay for audit but free their key for resubmission
        if next == EntityStatus::Rejected {
            self.keys
                .remove_if(&(updated.kind, updated.payload.unique_key()), |_, holder| *holder == id);
        }

        Ok(updated)
    }

    fn list(&self, filter: &EntityFilter) -> Result<Vec<Entity>, StoreError> {
        let mut matching: Vec<Entity> = self
            .entities
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(matching)
    }

    fn contains_key(&self, kind: EntityKind, key: &str) -> Result<bool, StoreError> {
        Ok(self.keys.contains_key(&(kind, key.to_string())))
    }
}
