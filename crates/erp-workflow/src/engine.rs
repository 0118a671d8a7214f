//! Workflow engine
//!
//! Enforces the create -> verify/reject lifecycle uniformly across entity
//! kinds. The engine owns no entity state of its own: every status change is
//! an atomic check-and-set in the [`EntityStore`], so concurrent reviewers on
//! the same entity are serialized there.

use crate::audit::{AuditEvent, AuditLog};
use crate::batch::{BatchFailure, BatchOutcome};
use crate::effects::ApprovalEffect;
use crate::error::{StateError, ValidationError, WorkflowError};
use crate::routing::RoutingTable;
use crate::state_machine::validate_transition;
use crate::validation::{validate_remarks, PayloadValidator, SchemaValidator};
use erp_store::{
    BatchId, Entity, EntityFilter, EntityId, EntityPayload, EntityStatus, EntityStore, RemarksEntry,
    RoleId, WorkflowAction,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Reject decisions from roles not routed for the entity kind
    pub enforce_routing: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            enforce_routing: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn target(self) -> EntityStatus {
        match self {
            Decision::Approve => EntityStatus::Approved,
            Decision::Reject => EntityStatus::Rejected,
        }
    }

    fn action(self) -> WorkflowAction {
        match self {
            Decision::Approve => WorkflowAction::Approved,
            Decision::Reject => WorkflowAction::Rejected,
        }
    }
}

/// Generic approval workflow over any [`EntityStore`]
pub struct WorkflowEngine<S: EntityStore> {
    store: Arc<S>,
    routing: RoutingTable,
    config: WorkflowConfig,
    validators: Vec<Box<dyn PayloadValidator>>,
    effects: Vec<Box<dyn ApprovalEffect>>,
    audit: AuditLog,
}

impl<S: EntityStore> std::fmt::Debug for WorkflowEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("routing", &self.routing)
            .field("config", &self.config)
            .field("validators", &self.validators.len())
            .field("effects", &self.effects.len())
            .field("audit_events", &self.audit.len())
            .finish_non_exhaustive()
    }
}

impl<S: EntityStore> WorkflowEngine<S> {
    /// Create engine with schema validation and default configuration
    #[must_use]
    pub fn new(store: Arc<S>, routing: RoutingTable) -> Self {
        Self {
            store,
            routing,
            config: WorkflowConfig::default(),
            validators: vec![Box::new(SchemaValidator)],
            effects: Vec::new(),
            audit: AuditLog::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a payload validator (runs after the schema check)
    #[inline]
    #[must_use]
    pub fn with_validator(mut self, validator: impl PayloadValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Append an approval effect
    #[inline]
    #[must_use]
    pub fn with_effect(mut self, effect: impl ApprovalEffect + 'static) -> Self {
        self.effects.push(Box::new(effect));
        self
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Routing table
    #[inline]
    #[must_use]
    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> WorkflowConfig {
        self.config
    }

    /// Transition audit trail
    #[inline]
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Fetch entity by id
    ///
    /// # Errors
    /// `WorkflowError::NotFound`, or `Transport` if the store fails
    pub fn get(&self, id: EntityId) -> Result<Entity, WorkflowError> {
        Ok(self.store.get(id)?)
    }

    /// Run every validator over a normalized copy of `payload`
    ///
    /// # Errors
    /// First `ValidationError` raised
    pub fn validate_payload(&self, payload: &EntityPayload) -> Result<EntityPayload, WorkflowError> {
        let payload = payload.clone().normalized();
        for validator in &self.validators {
            validator.validate(&payload)?;
        }
        Ok(payload)
    }

    /// Create an entity awaiting verification
    ///
    /// # Errors
    /// - `ValidationError` for schema violations or duplicate unique keys
    /// - `Transport` if the store fails
    pub fn submit(
        &self,
        payload: EntityPayload,
        actor: &RoleId,
        batch: Option<BatchId>,
    ) -> Result<Entity, WorkflowError> {
        if actor.is_blank() {
            return Err(ValidationError::RoleRequired.into());
        }
        let entity = self.pending(&payload, actor, batch)?;
        let stored = self.store.insert(entity)?;
        self.record_submission(&stored, actor);
        Ok(stored)
    }

    /// Create several entities under one batch, all or none
    ///
    /// # Errors
    /// - `ValidationError` for the first invalid payload or held unique key;
    ///   nothing is stored in that case
    /// - `Transport` if the store fails
    pub fn submit_all(
        &self,
        payloads: &[EntityPayload],
        actor: &RoleId,
        batch: BatchId,
    ) -> Result<Vec<Entity>, WorkflowError> {
        if actor.is_blank() {
            return Err(ValidationError::RoleRequired.into());
        }
        let entities = payloads
            .iter()
            .map(|payload| self.pending(payload, actor, Some(batch)))
            .collect::<Result<Vec<_>, _>>()?;

        let stored = self.store.insert_all(entities)?;
        for entity in &stored {
            self.record_submission(entity, actor);
        }
        Ok(stored)
    }

    fn pending(
        &self,
        payload: &EntityPayload,
        actor: &RoleId,
        batch: Option<BatchId>,
    ) -> Result<Entity, WorkflowError> {
        let payload = self.validate_payload(payload)?;
        let mut entity = Entity::draft(payload, actor.clone(), batch);
        validate_transition(entity.status, EntityStatus::PendingVerification)?;
        entity.status = EntityStatus::PendingVerification;
        entity
            .remarks_history
            .push(RemarksEntry::now(actor.clone(), WorkflowAction::Submitted, "submitted"));
        Ok(entity)
    }

    fn record_submission(&self, stored: &Entity, actor: &RoleId) {
        self.audit.append(AuditEvent::new(
            stored.id,
            stored.kind,
            WorkflowAction::Submitted,
            actor.clone(),
            "submitted",
        ));
        tracing::info!(
            id = %stored.id,
            kind = %stored.kind,
            actor = %actor,
            batch = ?stored.creation_batch_id,
            "submitted entity for verification"
        );
    }

    /// Approve a pending entity
    ///
    /// # Errors
    /// - `ValidationError::RemarksRequired` for blank remarks
    /// - `NotFound` for unknown ids
    /// - `NotPermitted` if routing is enforced and `actor` is not routed
    /// - `StateError::AlreadyFinalized` if the entity is approved or rejected,
    ///   including when another reviewer wins the race
    /// - `ValidationError` if an approval effect vetoes
    pub fn approve(&self, id: EntityId, actor: &RoleId, remarks: &str) -> Result<Entity, WorkflowError> {
        self.decide(id, actor, remarks, Decision::Approve)
    }

    /// Reject a pending entity; it stays stored for audit
    ///
    /// # Errors
    /// Same as [`WorkflowEngine::approve`], minus the effect veto
    pub fn reject(&self, id: EntityId, actor: &RoleId, remarks: &str) -> Result<Entity, WorkflowError> {
        self.decide(id, actor, remarks, Decision::Reject)
    }

    /// Approve every member of a batch, best-effort per member
    ///
    /// # Errors
    /// Whole-call failures only: blank remarks, blank role, unknown batch,
    /// store failure while listing members
    pub fn approve_batch(
        &self,
        batch: BatchId,
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, WorkflowError> {
        self.decide_batch(batch, actor, remarks, Decision::Approve)
    }

    /// Reject every member of a batch, best-effort per member
    ///
    /// # Errors
    /// Same as [`WorkflowEngine::approve_batch`]
    pub fn reject_batch(
        &self,
        batch: BatchId,
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, WorkflowError> {
        self.decide_batch(batch, actor, remarks, Decision::Reject)
    }

    /// Approve an explicit id selection, best-effort per id
    ///
    /// # Errors
    /// Blank remarks, blank role or an empty selection
    pub fn approve_ids(
        &self,
        ids: &[EntityId],
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, WorkflowError> {
        self.decide_selection(ids, actor, remarks, Decision::Approve)
    }

    /// Reject an explicit id selection, best-effort per id
    ///
    /// # Errors
    /// Same as [`WorkflowEngine::approve_ids`]
    pub fn reject_ids(
        &self,
        ids: &[EntityId],
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, WorkflowError> {
        self.decide_selection(ids, actor, remarks, Decision::Reject)
    }

    fn decide(
        &self,
        id: EntityId,
        actor: &RoleId,
        remarks: &str,
        decision: Decision,
    ) -> Result<Entity, WorkflowError> {
        let remarks = validate_remarks(remarks)?;
        if actor.is_blank() {
            return Err(ValidationError::RoleRequired.into());
        }

        let entity = self.store.get(id)?;
        if self.config.enforce_routing && !self.routing.may_review(entity.kind, actor) {
            return Err(WorkflowError::NotPermitted {
                role: actor.clone(),
                kind: entity.kind,
            });
        }
        if entity.status.is_terminal() {
            return Err(StateError::AlreadyFinalized {
                id,
                status: entity.status,
            }
            .into());
        }

        let target = decision.target();
        validate_transition(entity.status, target)?;

        let effects: Vec<&dyn ApprovalEffect> = match decision {
            Decision::Approve => self
                .effects
                .iter()
                .map(|effect| effect.as_ref())
                .filter(|effect| effect.applies_to(entity.kind))
                .collect(),
            Decision::Reject => Vec::new(),
        };
        for (prepared, effect) in effects.iter().enumerate() {
            if let Err(veto) = effect.prepare(&entity) {
                for earlier in &effects[..prepared] {
                    earlier.abort(&entity);
                }
                return Err(veto.into());
            }
        }

        let entry = RemarksEntry::now(actor.clone(), decision.action(), remarks);
        let updated = match self.store.transition(id, entity.status, target, entry) {
            Ok(updated) => updated,
            Err(e) => {
                for effect in &effects {
                    effect.abort(&entity);
                }
                tracing::warn!(id = %id, actor = %actor, error = %e, "decision lost");
                return Err(e.into());
            }
        };

        for effect in &effects {
            if let Err(reason) = effect.commit(&updated) {
                tracing::error!(id = %id, kind = %updated.kind, reason = %reason, "approval effect failed");
            }
        }

        self.audit.append(AuditEvent::new(
            id,
            updated.kind,
            decision.action(),
            actor.clone(),
            remarks,
        ));
        tracing::info!(
            id = %id,
            kind = %updated.kind,
            actor = %actor,
            status = %updated.status,
            "entity decided"
        );
        Ok(updated)
    }

    fn decide_batch(
        &self,
        batch: BatchId,
        actor: &RoleId,
        remarks: &str,
        decision: Decision,
    ) -> Result<BatchOutcome, WorkflowError> {
        validate_remarks(remarks)?;
        if actor.is_blank() {
            return Err(ValidationError::RoleRequired.into());
        }

        let members = self.store.list(&EntityFilter::batch(batch))?;
        if members.is_empty() {
            return Err(WorkflowError::NotFound(format!("batch {batch}")));
        }

        let ids: Vec<EntityId> = members.iter().map(|e| e.id).collect();
        let outcome = self.decide_each(&ids, actor, remarks, decision);
        tracing::info!(
            batch = %batch,
            actor = %actor,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "batch decided"
        );
        Ok(outcome)
    }

    fn decide_selection(
        &self,
        ids: &[EntityId],
        actor: &RoleId,
        remarks: &str,
        decision: Decision,
    ) -> Result<BatchOutcome, WorkflowError> {
        validate_remarks(remarks)?;
        if actor.is_blank() {
            return Err(ValidationError::RoleRequired.into());
        }
        if ids.is_empty() {
            return Err(ValidationError::invalid("no entities selected").into());
        }

        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<EntityId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        Ok(self.decide_each(&unique, actor, remarks, decision))
    }

    fn decide_each(
        &self,
        ids: &[EntityId],
        actor: &RoleId,
        remarks: &str,
        decision: Decision,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match self.decide(id, actor, remarks, decision) {
                Ok(_) => outcome.succeeded.push(id),
                Err(e) => outcome.failed.push(BatchFailure {
                    id,
                    reason: e.to_string(),
                }),
            }
        }
        outcome
    }
}
