//! Service facade
//!
//! [`ErpService`] wires the entity store, unit registry, workflow engine and
//! queue projection together. Handlers receive it explicitly; there is no
//! global instance.

use crate::config::ErpConfig;
use crate::error::ErpError;
use crate::unit_rules::{UnitReferenceValidator, UnitRegistration};
use erp_queue::{BatchGroup, VerificationQueue};
use erp_store::{
    BatchId, Entity, EntityFilter, EntityId, EntityKind, EntityPayload, EntityStatus, EntityStore,
    InMemoryStore, RoleId,
};
use erp_units::{preview_conversion, PreviewRow, Unit, UnitRegistry, UnitType};
use erp_workflow::{BatchOutcome, WorkflowEngine};
use std::sync::Arc;

/// ERP master-data service
#[derive(Debug)]
pub struct ErpService<S: EntityStore = InMemoryStore> {
    units: Arc<UnitRegistry>,
    engine: WorkflowEngine<S>,
}

impl ErpService<InMemoryStore> {
    /// Create service over a fresh in-memory store
    ///
    /// # Errors
    /// `ErpError::Config` for bad routing, `ErpError::Validation` for a bad
    /// seed unit
    pub fn new(config: &ErpConfig) -> Result<Self, ErpError> {
        Self::with_store(Arc::new(InMemoryStore::new()), config)
    }
}

impl<S: EntityStore> ErpService<S> {
    /// Create service over an existing store
    ///
    /// # Errors
    /// Same as [`ErpService::new`]
    pub fn with_store(store: Arc<S>, config: &ErpConfig) -> Result<Self, ErpError> {
        let units = Arc::new(UnitRegistry::with_policy(config.units.policy()));
        for def in &config.units.seed {
            units.register_unit(def)?;
        }

        let engine = WorkflowEngine::new(store, config.routing_table()?)
            .with_config(config.workflow)
            .with_validator(UnitReferenceValidator::new(Arc::clone(&units)))
            .with_effect(UnitRegistration::new(Arc::clone(&units)));

        tracing::info!(
            seed_units = units.len(),
            policy = ?units.policy(),
            enforce_routing = config.workflow.enforce_routing,
            "service ready"
        );
        Ok(Self { units, engine })
    }

    /// Workflow engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &WorkflowEngine<S> {
        &self.engine
    }

    /// Unit registry
    #[inline]
    #[must_use]
    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Verification queue projection
    #[inline]
    #[must_use]
    pub fn queue(&self) -> VerificationQueue<'_, S> {
        VerificationQueue::new(self.engine.store().as_ref(), self.engine.routing())
    }

    /// Submit one entity for verification
    ///
    /// # Errors
    /// Validation or transport failure
    pub fn submit(
        &self,
        payload: EntityPayload,
        actor: &RoleId,
        batch: Option<BatchId>,
    ) -> Result<Entity, ErpError> {
        Ok(self.engine.submit(payload, actor, batch)?)
    }

    /// Fetch entity by id
    ///
    /// # Errors
    /// `ErpError::NotFound`
    pub fn get(&self, id: EntityId) -> Result<Entity, ErpError> {
        Ok(self.engine.get(id)?)
    }

    /// Approve one entity
    ///
    /// # Errors
    /// See [`WorkflowEngine::approve`]
    pub fn approve(&self, id: EntityId, actor: &RoleId, remarks: &str) -> Result<Entity, ErpError> {
        Ok(self.engine.approve(id, actor, remarks)?)
    }

    /// Reject one entity
    ///
    /// # Errors
    /// See [`WorkflowEngine::reject`]
    pub fn reject(&self, id: EntityId, actor: &RoleId, remarks: &str) -> Result<Entity, ErpError> {
        Ok(self.engine.reject(id, actor, remarks)?)
    }

    /// Approve a creation batch
    ///
    /// # Errors
    /// See [`WorkflowEngine::approve_batch`]
    pub fn approve_batch(
        &self,
        batch: BatchId,
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, ErpError> {
        Ok(self.engine.approve_batch(batch, actor, remarks)?)
    }

    /// Reject a creation batch
    ///
    /// # Errors
    /// See [`WorkflowEngine::reject_batch`]
    pub fn reject_batch(
        &self,
        batch: BatchId,
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, ErpError> {
        Ok(self.engine.reject_batch(batch, actor, remarks)?)
    }

    /// Approve an explicit selection
    ///
    /// # Errors
    /// See [`WorkflowEngine::approve_ids`]
    pub fn approve_ids(
        &self,
        ids: &[EntityId],
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, ErpError> {
        Ok(self.engine.approve_ids(ids, actor, remarks)?)
    }

    /// Reject an explicit selection
    ///
    /// # Errors
    /// See [`WorkflowEngine::reject_ids`]
    pub fn reject_ids(
        &self,
        ids: &[EntityId],
        actor: &RoleId,
        remarks: &str,
    ) -> Result<BatchOutcome, ErpError> {
        Ok(self.engine.reject_ids(ids, actor, remarks)?)
    }

    /// Approved entities of a kind, oldest first
    ///
    /// # Errors
    /// `ErpError::Transport` if the store cannot be read
    pub fn approved(&self, kind: EntityKind) -> Result<Vec<Entity>, ErpError> {
        let filter = EntityFilter::all()
            .with_kind(kind)
            .with_status(EntityStatus::Approved);
        Ok(self.engine.store().list(&filter)?)
    }

    /// Pending entities of `kind` awaiting `role`
    ///
    /// # Errors
    /// `ErpError::Transport` if the store cannot be read
    pub fn queue_for(&self, role: &RoleId, kind: EntityKind) -> Result<Vec<Entity>, ErpError> {
        Ok(self.queue().queue_for(role, kind)?)
    }

    /// Pending batches of `kind` awaiting `role`
    ///
    /// # Errors
    /// `ErpError::Transport` if the store cannot be read
    pub fn batches_for(&self, role: &RoleId, kind: EntityKind) -> Result<Vec<BatchGroup>, ErpError> {
        Ok(self.queue().batches_for(role, kind)?)
    }

    /// Units of a family, optionally excluding one
    #[must_use]
    pub fn units_by_type(&self, unit_type: UnitType, exclude: Option<&str>) -> Vec<Unit> {
        self.units.units_by_type(unit_type, exclude)
    }

    /// Units an item with this primary unit may use
    ///
    /// # Errors
    /// `ErpError::NotFound` for unknown units
    pub fn allowed_units_for(&self, primary: &str) -> Result<Vec<Unit>, ErpError> {
        Ok(self.units.allowed_units_for(primary)?)
    }

    /// Convert an amount between registered units
    ///
    /// # Errors
    /// `ErpError::NotFound` or `ErpError::IncompatibleUnits`
    pub fn convert(&self, from: &str, to: &str, amount: f64) -> Result<f64, ErpError> {
        Ok(self.units.convert(from, to, amount)?)
    }

    /// Preview an unsaved factor over sample values
    ///
    /// # Errors
    /// `ErpError::Validation` for invalid symbols or factors
    pub fn preview(
        &self,
        base: &str,
        target: &str,
        factor: f64,
        samples: &[f64],
    ) -> Result<Vec<PreviewRow>, ErpError> {
        Ok(preview_conversion(base, target, factor, samples)?)
    }
}
