//! Bulk upload
//!
//! Spreadsheet rows arrive here already parsed into payloads. The upload is
//! all-or-nothing: every row is checked first, then all rows are stored in
//! one step under a fresh [`BatchId`] so reviewers can decide them together.
//! A key taken by a concurrent submitter in between rejects the whole upload
//! and stores nothing.

use crate::error::{ErpError, RowError};
use crate::service::ErpService;
use erp_store::{BatchId, Entity, EntityKind, EntityPayload, EntityStore, RoleId};
use erp_workflow::{ValidationError, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Parsed upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpload {
    /// Rows in file order
    pub rows: Vec<EntityPayload>,
    /// Submitting role
    pub uploaded_by: RoleId,
    /// Source file name, for the logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl BulkUpload {
    /// Create upload
    #[must_use]
    pub fn new(rows: Vec<EntityPayload>, uploaded_by: RoleId) -> Self {
        Self {
            rows,
            uploaded_by,
            file_name: None,
        }
    }

    /// With source file name
    #[inline]
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// Accepted upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReceipt {
    /// Batch shared by every submitted row
    pub batch_id: BatchId,
    /// Submitted entities in row order
    pub entities: Vec<Entity>,
}

impl<S: EntityStore> ErpService<S> {
    /// Validate and submit a bulk upload
    ///
    /// # Errors
    /// - `ErpError::Validation` for an empty upload or blank uploader
    /// - `ErpError::UploadRejected` listing every failing row
    /// - `ErpError::Transport` if the store fails
    pub fn submit_bulk(&self, upload: BulkUpload) -> Result<BulkReceipt, ErpError> {
        if upload.uploaded_by.is_blank() {
            return Err(ValidationError::RoleRequired.into());
        }
        if upload.rows.is_empty() {
            return Err(ValidationError::invalid("upload contains no rows").into());
        }

        let total = upload.rows.len();
        let mut failures = Vec::new();
        let mut accepted = Vec::with_capacity(total);
        let mut seen: HashSet<(EntityKind, String)> = HashSet::with_capacity(total);

        for (index, row) in upload.rows.iter().enumerate() {
            let row_number = index + 1;
            match self.check_row(row, &mut seen) {
                Ok(normalized) => accepted.push(normalized),
                Err(WorkflowError::Transport(reason)) => return Err(ErpError::Transport(reason)),
                Err(e) => failures.push(RowError {
                    row: row_number,
                    reason: e.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                file = upload.file_name.as_deref().unwrap_or("-"),
                total,
                failed = failures.len(),
                "bulk upload rejected"
            );
            return Err(ErpError::UploadRejected {
                total,
                rows: failures,
            });
        }

        let batch_id = BatchId::new();
        let entities = match self.engine().submit_all(&accepted, &upload.uploaded_by, batch_id) {
            Ok(entities) => entities,
            Err(WorkflowError::Transport(reason)) => return Err(ErpError::Transport(reason)),
            Err(e) => {
                let row = failing_row(&accepted, &e);
                tracing::warn!(batch = %batch_id, row, error = %e, "bulk upload lost a race");
                return Err(ErpError::UploadRejected {
                    total,
                    rows: vec![RowError {
                        row,
                        reason: e.to_string(),
                    }],
                });
            }
        };

        tracing::info!(
            batch = %batch_id,
            file = upload.file_name.as_deref().unwrap_or("-"),
            rows = entities.len(),
            actor = %upload.uploaded_by,
            "bulk upload submitted"
        );
        Ok(BulkReceipt { batch_id, entities })
    }

    fn check_row(
        &self,
        row: &EntityPayload,
        seen: &mut HashSet<(EntityKind, String)>,
    ) -> Result<EntityPayload, WorkflowError> {
        let normalized = self.engine().validate_payload(row)?;
        let kind = normalized.kind();
        let key = normalized.unique_key();

        if !seen.insert((kind, key.clone())) {
            return Err(ValidationError::invalid(format!("{kind} {key} appears more than once in the upload")).into());
        }
        if self.engine().store().contains_key(kind, &key)? {
            return Err(ValidationError::Duplicate { kind, key }.into());
        }
        Ok(normalized)
    }
}

/// One-based row holding the key a store-level duplicate names
fn failing_row(rows: &[EntityPayload], err: &WorkflowError) -> usize {
    match err {
        WorkflowError::Validation(ValidationError::Duplicate { kind, key }) => rows
            .iter()
            .position(|row| row.kind() == *kind && row.unique_key() == *key)
            .map_or(1, |index| index + 1),
        _ => 1,
    }
}
