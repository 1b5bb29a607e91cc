//! Audit record repository
//!
//! The table is append-only: triggers in the schema abort any UPDATE or
//! DELETE, and this module exposes no way to issue one.

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{format_db_timestamp, parse_db_timestamp};
use crate::models::{AuditAction, AuditRecord};

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    action: String,
    target_id: String,
    actor_id: String,
    organization_id: String,
    origin: Option<String>,
    before_state: Option<String>,
    after_state: String,
    changed_fields: String,
    created_at: String,
}

pub struct AuditRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// History of one establishment, oldest first
    pub async fn list_for_target(&self, target_id: &str) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, action, target_id, actor_id, organization_id, origin,
                   before_state, after_state, changed_fields, created_at
            FROM audit_records
            WHERE target_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(target_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list audit records")?;

        Ok(rows.into_iter().map(row_to_audit).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_records")
            .fetch_one(self.pool)
            .await
            .context("Failed to count audit records")?;
        Ok(count)
    }
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    record: &AuditRecord,
) -> Result<(), sqlx::Error> {
    let before = record.before.as_ref().map(|v| v.to_string());
    let changed = serde_json::Value::from(record.changed_fields.clone()).to_string();

    sqlx::query(
        r#"
        INSERT INTO audit_records (
            id, action, target_id, actor_id, organization_id, origin,
            before_state, after_state, changed_fields, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.action.as_str())
    .bind(&record.target_id)
    .bind(record.actor_id.to_string())
    .bind(record.organization_id.to_string())
    .bind(&record.origin)
    .bind(before)
    .bind(record.after.to_string())
    .bind(changed)
    .bind(format_db_timestamp(&record.created_at))
    .execute(conn)
    .await?;

    Ok(())
}

fn row_to_audit(row: AuditRow) -> AuditRecord {
    AuditRecord {
        id: Uuid::parse_str(&row.id).unwrap_or_else(|_| Uuid::nil()),
        action: AuditAction::parse(&row.action).unwrap_or(AuditAction::Update),
        target_id: row.target_id,
        actor_id: Uuid::parse_str(&row.actor_id).unwrap_or_else(|_| Uuid::nil()),
        organization_id: Uuid::parse_str(&row.organization_id).unwrap_or_else(|_| Uuid::nil()),
        origin: row.origin,
        before: row.before_state.and_then(|s| serde_json::from_str(&s).ok()),
        after: serde_json::from_str(&row.after_state).unwrap_or(serde_json::Value::Null),
        changed_fields: serde_json::from_str(&row.changed_fields).unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
    }
}
