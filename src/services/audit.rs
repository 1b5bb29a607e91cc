//! Audit recorder
//!
//! Builds immutable before/after change records and appends them to the
//! caller's unit of work. There is no entry point that writes an audit
//! record outside a transaction carrying the matching state change.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::{self, UnitOfWork};
use crate::models::{AuditAction, AuditRecord, ResolvedActor};
use crate::utils::PipelineError;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditRecorder;

impl AuditRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Append one audit record to `uow`.
    ///
    /// `before` and `after` are stored as given; the recorder only compares
    /// them to list which top-level fields differ.
    pub async fn record(
        &self,
        uow: &mut UnitOfWork,
        action: AuditAction,
        target_id: &str,
        actor: &ResolvedActor,
        before: Option<Value>,
        after: Value,
    ) -> Result<AuditRecord, PipelineError> {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            action,
            target_id: target_id.to_string(),
            actor_id: actor.actor_id,
            organization_id: actor.organization_id,
            origin: actor.origin.clone(),
            changed_fields: changed_fields(before.as_ref(), &after),
            before,
            after,
            created_at: db::now(),
        };

        uow.append_audit(&record).await?;
        Ok(record)
    }
}

/// Serialize a state into an audit snapshot
pub fn snapshot<T: Serialize>(state: &T) -> Result<Value, PipelineError> {
    serde_json::to_value(state)
        .map_err(|e| PipelineError::ConflictOnCommit(format!("snapshot serialization: {e}")))
}

/// Top-level keys whose values differ. Every key of `after` counts as
/// changed when there is no `before`.
pub fn changed_fields(before: Option<&Value>, after: &Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let after_map = after.as_object().unwrap_or(&empty);
    let before_map = before.and_then(Value::as_object).unwrap_or(&empty);

    let mut keys: Vec<&String> = after_map.keys().chain(before_map.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter(|k| after_map.get(*k) != before_map.get(*k))
        .cloned()
        .collect()
}
