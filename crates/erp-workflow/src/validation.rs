//! Submission-time validation

use crate::error::ValidationError;
use erp_store::EntityPayload;

/// Checks a payload before it is persisted
///
/// Validators run in registration order; the first failure wins and nothing
/// is stored.
pub trait PayloadValidator: Send + Sync {
    /// Validate a normalized payload
    ///
    /// # Errors
    /// The violated rule
    fn validate(&self, payload: &EntityPayload) -> Result<(), ValidationError>;
}

/// Per-type required fields and formats
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl PayloadValidator for SchemaValidator {
    fn validate(&self, payload: &EntityPayload) -> Result<(), ValidationError> {
        payload.check_schema().map_err(ValidationError::from)
    }
}

/// Trimmed remarks, required on every decision
///
/// # Errors
/// `ValidationError::RemarksRequired` for blank remarks
pub fn validate_remarks(remarks: &str) -> Result<&str, ValidationError> {
    let trimmed = remarks.trim();
    if trimmed.is_empty() {
        Err(ValidationError::RemarksRequired)
    } else {
        Ok(trimmed)
    }
}
