//! Transition audit trail
//!
//! Every submission and decision is appended to an [`AuditLog`]. Each event
//! carries the SHA-256 of its predecessor, so editing any recorded event
//! breaks [`AuditLog::verify_integrity`].

use chrono::{DateTime, Utc};
use erp_store::{EntityId, EntityKind, RoleId, WorkflowAction};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique audit event identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEventId(pub Uuid);

impl AuditEventId {
    /// Generate new event ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit log error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// Hash chain mismatch
    #[error("audit chain broken at event {index}")]
    IntegrityViolation {
        /// Position of the first bad event
        index: usize,
    },
}

/// One workflow transition, chained to its predecessor by hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event ID
    pub event_id: AuditEventId,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Entity acted on
    pub entity_id: EntityId,
    /// Entity type
    pub kind: EntityKind,
    /// What happened
    pub action: WorkflowAction,
    /// Acting role
    pub actor: RoleId,
    /// Remarks as recorded
    pub remarks: String,
    /// Hash of the previous event
    pub prev_hash: [u8; 32],
    /// Hash of this event
    pub hash: [u8; 32],
}

impl AuditEvent {
    /// Unchained event; `AuditLog::append` fills in the hashes
    pub fn new(
        entity_id: EntityId,
        kind: EntityKind,
        action: WorkflowAction,
        actor: RoleId,
        remarks: impl Into<String>,
    ) -> Self {
        Self {
            event_id: AuditEventId::new(),
            timestamp: Utc::now(),
            entity_id,
            kind,
            action,
            actor,
            remarks: remarks.into(),
            prev_hash: [0u8; 32],
            hash: [0u8; 32],
        }
    }
}

/// Append-only, hash-chained event log
#[derive(Debug, Default)]
pub struct AuditLog {
    inner: Mutex<Vec<AuditEvent>>,
}

impl AuditLog {
    /// Chain and append event
    pub fn append(&self, mut event: AuditEvent) -> AuditEventId {
        let mut guard = self.inner.lock();
        let prev_hash = guard.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        event.prev_hash = prev_hash;
        event.hash = compute_hash(&event);
        let id = event.event_id;
        guard.push(event);
        id
    }

    /// Snapshot of all events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().clone()
    }

    /// Events for one entity
    #[must_use]
    pub fn events_for(&self, entity_id: EntityId) -> Vec<AuditEvent> {
        self.inner
            .lock()
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hex hash of the latest event, all zeros for an empty log
    #[must_use]
    pub fn head_hash(&self) -> String {
        let guard = self.inner.lock();
        hex::encode(guard.last().map(|e| e.hash).unwrap_or([0u8; 32]))
    }

    /// Recompute every hash and check the links
    ///
    /// # Errors
    /// `AuditError::IntegrityViolation` at the first broken event
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for (index, e) in guard.iter().enumerate() {
            if e.prev_hash != prev {
                return Err(AuditError::IntegrityViolation { index });
            }
            let expected = compute_hash(e);
            if e.hash != expected {
                return Err(AuditError::IntegrityViolation { index });
            }
            prev = e.hash;
        }
        Ok(())
    }
}

fn compute_hash(event: &AuditEvent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(event.event_id.0.as_bytes());
    hasher.update(event.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(event.entity_id.0.to_bytes());
    hasher.update(event.kind.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(event.action.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(event.actor.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(event.remarks.as_bytes());
    hasher.update([0]);
    hasher.update(event.prev_hash);
    hasher.finalize().into()
}
