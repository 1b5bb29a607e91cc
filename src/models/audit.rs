//! Audit record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of mutation an audit record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Deactivate,
    Reactivate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Deactivate => "deactivate",
            AuditAction::Reactivate => "reactivate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(AuditAction::Create),
            "update" => Some(AuditAction::Update),
            "deactivate" => Some(AuditAction::Deactivate),
            "reactivate" => Some(AuditAction::Reactivate),
            _ => None,
        }
    }
}

/// Immutable before/after record of one committed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    /// Identifier of the mutated establishment
    pub target_id: String,
    pub actor_id: Uuid,
    pub organization_id: Uuid,
    /// Network origin of the request
    pub origin: Option<String>,
    /// State before the mutation; `None` for creations
    pub before: Option<serde_json::Value>,
    pub after: serde_json::Value,
    /// Top-level fields whose value differs between `before` and `after`
    pub changed_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}
