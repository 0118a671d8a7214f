//! Entity record
//!
//! Every record subject to the create → verify/reject workflow shares this
//! envelope; the domain fields live in [`EntityPayload`].

use crate::ids::{BatchId, EntityId, RoleId};
use crate::payload::EntityPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity type, one per payload variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Fixed deposit account
    #[serde(rename = "FIXED_DEPOSIT")]
    FixedDeposit,
    /// HSN/SAC tax code
    #[serde(rename = "HSN")]
    HsnCode,
    /// Inventory base item code
    #[serde(rename = "BASE_ITEM_CODE")]
    BaseItemCode,
    /// Specification under a base item code
    #[serde(rename = "SPECIFICATION")]
    Specification,
    /// Unit of measure
    #[serde(rename = "UNIT")]
    Unit,
    /// Client purchase order
    #[serde(rename = "CLIENT_PO")]
    ClientPurchaseOrder,
}

impl EntityKind {
    /// All entity kinds in declaration order
    pub const ALL: [EntityKind; 6] = [
        EntityKind::FixedDeposit,
        EntityKind::HsnCode,
        EntityKind::BaseItemCode,
        EntityKind::Specification,
        EntityKind::Unit,
        EntityKind::ClientPurchaseOrder,
    ];

    /// Canonical wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::FixedDeposit => "FIXED_DEPOSIT",
            EntityKind::HsnCode => "HSN",
            EntityKind::BaseItemCode => "BASE_ITEM_CODE",
            EntityKind::Specification => "SPECIFICATION",
            EntityKind::Unit => "UNIT",
            EntityKind::ClientPurchaseOrder => "CLIENT_PO",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match wanted.as_str() {
            "FIXED_DEPOSIT" | "FD" => Ok(EntityKind::FixedDeposit),
            "HSN" | "HSN_CODE" | "SAC" => Ok(EntityKind::HsnCode),
            "BASE_ITEM_CODE" | "BASE_CODE" => Ok(EntityKind::BaseItemCode),
            "SPECIFICATION" | "SPEC" => Ok(EntityKind::Specification),
            "UNIT" => Ok(EntityKind::Unit),
            "CLIENT_PO" | "PURCHASE_ORDER" => Ok(EntityKind::ClientPurchaseOrder),
            _ => Err(format!("unknown entity kind: {s}")),
        }
    }
}

/// Workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityStatus {
    /// Transient, before submission completes
    Draft,
    /// Awaiting a reviewer decision
    PendingVerification,
    /// Accepted (terminal)
    Approved,
    /// Declined (terminal, kept for audit)
    Rejected,
}

impl EntityStatus {
    /// Approved and Rejected admit no further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, EntityStatus::Approved | EntityStatus::Rejected)
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Action recorded in the remarks history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowAction {
    /// Entity created
    Submitted,
    /// Entity approved
    Approved,
    /// Entity rejected
    Rejected,
}

impl WorkflowAction {
    /// Canonical upper-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowAction::Submitted => "SUBMITTED",
            WorkflowAction::Approved => "APPROVED",
            WorkflowAction::Rejected => "REJECTED",
        }
    }
}

/// One remarks-history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemarksEntry {
    /// Role that performed the action
    pub actor_role_id: RoleId,
    /// Free-text remarks
    pub remarks: String,
    /// What happened
    pub action: WorkflowAction,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl RemarksEntry {
    /// Create entry stamped now
    #[must_use]
    pub fn now(actor_role_id: RoleId, action: WorkflowAction, remarks: impl Into<String>) -> Self {
        Self {
            actor_role_id,
            remarks: remarks.into(),
            action,
            timestamp: Utc::now(),
        }
    }
}

/// Versioned entity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Immutable identifier
    pub id: EntityId,
    /// Entity type, derived from the payload
    pub kind: EntityKind,
    /// Workflow status
    pub status: EntityStatus,
    /// Domain fields
    pub payload: EntityPayload,
    /// Append-only history, oldest first
    pub remarks_history: Vec<RemarksEntry>,
    /// Set when created as part of a bulk upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_batch_id: Option<BatchId>,
    /// Role that submitted the entity
    pub submitted_by: RoleId,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
    /// Store-assigned insertion order
    pub sequence: u64,
    /// Starts at 1, bumped on every status change
    pub version: u32,
}

impl Entity {
    /// Create a draft record with a fresh id
    #[must_use]
    pub fn draft(payload: EntityPayload, submitted_by: RoleId, batch: Option<BatchId>) -> Self {
        Self {
            id: EntityId::new(),
            kind: payload.kind(),
            status: EntityStatus::Draft,
            payload,
            remarks_history: Vec::new(),
            creation_batch_id: batch,
            submitted_by,
            submitted_at: Utc::now(),
            sequence: 0,
            version: 1,
        }
    }

    /// Most recent remarks entry
    #[inline]
    #[must_use]
    pub fn last_remarks(&self) -> Option<&RemarksEntry> {
        self.remarks_history.last()
    }

    /// Visible to active-use queries (everything except rejected)
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != EntityStatus::Rejected
    }
}
