//! Boundary contracts
//!
//! Request/response shapes for the HTTP layer, which itself lives outside
//! this crate. Every call takes the caller's bearer credential; a missing
//! one fails locally with [`ErpError::Unauthenticated`] before anything else
//! runs.

use crate::bulk::BulkUpload;
use crate::error::ErpError;
use crate::service::ErpService;
use erp_queue::{BatchGroup, QueueMode};
use erp_store::{BatchId, Entity, EntityId, EntityKind, EntityPayload, EntityStore, InMemoryStore, RoleId};
use erp_units::{Unit, UnitType};
use erp_workflow::{BatchFailure, BatchOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque bearer credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Token as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if token is empty or whitespace
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `Authorization` header value
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0.trim())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Error body of a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Machine-readable category
    pub kind: String,
    /// User-facing message
    pub message: String,
    /// Whether the user may retry
    pub retryable: bool,
}

impl From<&ErpError> for ApiErrorBody {
    fn from(err: &ErpError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

/// Response envelope: `{success, data, error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub success: bool,
    /// Result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    /// Successful response
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response
    #[must_use]
    pub fn failure(err: &ErpError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.into()),
        }
    }
}

impl<T> From<Result<T, ErpError>> for ApiResponse<T> {
    fn from(result: Result<T, ErpError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                tracing::debug!(kind = err.kind(), error = %err, "request failed");
                Self::failure(&err)
            }
        }
    }
}

/// Single payload or spreadsheet rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitPayload {
    /// Rows of an upload
    Many(Vec<EntityPayload>),
    /// One entity
    One(Box<EntityPayload>),
}

/// Upload file details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    /// Source file name
    #[serde(default)]
    pub file_name: Option<String>,
}

/// `POST` submit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// What to submit
    pub payload: SubmitPayload,
    /// Spreadsheet upload (all rows share one batch)
    #[serde(default)]
    pub is_excel_upload: bool,
    /// Upload details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_metadata: Option<BatchMetadata>,
    /// Submitting role
    pub submitted_by: RoleId,
}

/// Submitted entity or entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submitted {
    /// Upload rows
    Many(Vec<Entity>),
    /// Single entity
    One(Box<Entity>),
}

/// Verification list request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationListRequest {
    /// Requesting reviewer
    pub reviewer_role_id: RoleId,
    /// Entity type to list
    pub kind: EntityKind,
    /// Per-entity or per-batch rows
    #[serde(default)]
    pub mode: QueueMode,
}

/// Verification list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "items", rename_all = "lowercase")]
pub enum VerificationListing {
    /// Entities oldest first
    Single(Vec<Entity>),
    /// Batch groups ordered by oldest member
    Batch(Vec<BatchGroup>),
}

/// Approve/reject request for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Entity to decide
    pub entity_id: EntityId,
    /// Deciding reviewer
    pub reviewer_role_id: RoleId,
    /// Mandatory remarks
    pub remarks: String,
}

/// Approve/reject request for a group
///
/// `batch_id` is the canonical key; `entity_ids` is used only without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDecisionRequest {
    /// Creation batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
    /// Explicit selection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_ids: Vec<EntityId>,
    /// Deciding reviewer
    pub reviewer_role_id: RoleId,
    /// Mandatory remarks
    pub remarks: String,
}

/// `{success: [id], errors: [{id, reason}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResultLists {
    /// Decided entities
    pub success: Vec<EntityId>,
    /// Skipped or failed entities
    pub errors: Vec<BatchFailure>,
}

/// Batch decision result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Per-item results
    pub results: BatchResultLists,
}

impl From<BatchOutcome> for BatchResults {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            results: BatchResultLists {
                success: outcome.succeeded,
                errors: outcome.failed,
            },
        }
    }
}

/// Authenticated entry point for every boundary call
#[derive(Debug)]
pub struct ApiGateway<S: EntityStore = InMemoryStore> {
    service: Arc<ErpService<S>>,
}

impl<S: EntityStore> Clone for ApiGateway<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: EntityStore> ApiGateway<S> {
    /// Create gateway over a shared service
    #[inline]
    #[must_use]
    pub fn new(service: Arc<ErpService<S>>) -> Self {
        Self { service }
    }

    /// Underlying service
    #[inline]
    #[must_use]
    pub fn service(&self) -> &ErpService<S> {
        &self.service
    }

    /// Submit one entity or a spreadsheet upload
    pub fn submit(&self, token: Option<&BearerToken>, request: SubmitRequest) -> ApiResponse<Submitted> {
        self.call(token, |service| {
            let SubmitRequest {
                payload,
                is_excel_upload,
                batch_metadata,
                submitted_by,
            } = request;
            match (payload, is_excel_upload) {
                (SubmitPayload::One(payload), false) => service
                    .submit(*payload, &submitted_by, None)
                    .map(|e| Submitted::One(Box::new(e))),
                (payload, _) => {
                    let rows = match payload {
                        SubmitPayload::Many(rows) => rows,
                        SubmitPayload::One(row) => vec![*row],
                    };
                    let mut upload = BulkUpload::new(rows, submitted_by);
                    if let Some(name) = batch_metadata.and_then(|m| m.file_name) {
                        upload = upload.with_file_name(name);
                    }
                    service.submit_bulk(upload).map(|r| Submitted::Many(r.entities))
                }
            }
        })
    }

    /// Pending entities for a reviewer, per entity or per batch
    pub fn list_for_verification(
        &self,
        token: Option<&BearerToken>,
        request: &VerificationListRequest,
    ) -> ApiResponse<VerificationListing> {
        self.call(token, |service| match request.mode {
            QueueMode::Single => service
                .queue_for(&request.reviewer_role_id, request.kind)
                .map(VerificationListing::Single),
            QueueMode::Batch => service
                .batches_for(&request.reviewer_role_id, request.kind)
                .map(VerificationListing::Batch),
        })
    }

    /// Approve one entity
    pub fn approve(&self, token: Option<&BearerToken>, request: &DecisionRequest) -> ApiResponse<Entity> {
        self.call(token, |service| {
            service.approve(request.entity_id, &request.reviewer_role_id, &request.remarks)
        })
    }

    /// Reject one entity
    pub fn reject(&self, token: Option<&BearerToken>, request: &DecisionRequest) -> ApiResponse<Entity> {
        self.call(token, |service| {
            service.reject(request.entity_id, &request.reviewer_role_id, &request.remarks)
        })
    }

    /// Approve a batch or selection
    pub fn approve_batch(
        &self,
        token: Option<&BearerToken>,
        request: &BatchDecisionRequest,
    ) -> ApiResponse<BatchResults> {
        self.call(token, |service| {
            let role = &request.reviewer_role_id;
            match request.batch_id {
                Some(batch) => service.approve_batch(batch, role, &request.remarks),
                None => service.approve_ids(&request.entity_ids, role, &request.remarks),
            }
            .map(BatchResults::from)
        })
    }

    /// Reject a batch or selection
    pub fn reject_batch(
        &self,
        token: Option<&BearerToken>,
        request: &BatchDecisionRequest,
    ) -> ApiResponse<BatchResults> {
        self.call(token, |service| {
            let role = &request.reviewer_role_id;
            match request.batch_id {
                Some(batch) => service.reject_batch(batch, role, &request.remarks),
                None => service.reject_ids(&request.entity_ids, role, &request.remarks),
            }
            .map(BatchResults::from)
        })
    }

    /// Units of a family, optionally excluding one
    pub fn units_by_type(
        &self,
        token: Option<&BearerToken>,
        unit_type: UnitType,
        exclude: Option<&str>,
    ) -> ApiResponse<Vec<Unit>> {
        self.call(token, |service| Ok(service.units_by_type(unit_type, exclude)))
    }

    /// Units an item with this primary unit may use
    pub fn allowed_units_by_primary_unit(
        &self,
        token: Option<&BearerToken>,
        primary: &str,
    ) -> ApiResponse<Vec<Unit>> {
        self.call(token, |service| service.allowed_units_for(primary))
    }

    fn call<T>(
        &self,
        token: Option<&BearerToken>,
        op: impl FnOnce(&ErpService<S>) -> Result<T, ErpError>,
    ) -> ApiResponse<T> {
        authorize(token).and_then(|()| op(self.service.as_ref())).into()
    }
}

fn authorize(token: Option<&BearerToken>) -> Result<(), ErpError> {
    match token {
        Some(token) if !token.is_blank() => Ok(()),
        _ => Err(ErpError::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = BearerToken::new("secret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
        assert_eq!(token.header_value(), "Bearer secret");
    }

    #[test]
    fn blank_token_is_unauthenticated() {
        assert_eq!(authorize(None), Err(ErpError::Unauthenticated));
        assert_eq!(authorize(Some(&BearerToken::new("  "))), Err(ErpError::Unauthenticated));
        assert!(authorize(Some(&BearerToken::new("abc"))).is_ok());
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let response: ApiResponse<u32> = ApiResponse::failure(&ErpError::Unauthenticated);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": { "kind": "UNAUTHENTICATED", "message": "sign in required", "retryable": false }
            })
        );
    }

    #[test]
    fn batch_results_shape() {
        let id = EntityId::new();
        let results = BatchResults::from(BatchOutcome {
            succeeded: vec![],
            failed: vec![BatchFailure { id, reason: "already finalized".into() }],
        });
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["results"]["errors"][0]["reason"], "already finalized");
        assert_eq!(json["results"]["errors"][0]["id"], id.to_string());
        assert!(json["results"]["success"].as_array().unwrap().is_empty());
    }
}
