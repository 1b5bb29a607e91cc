//! Request trace repository

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::format_db_timestamp;
use crate::models::TraceRecord;

pub struct TraceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TraceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &TraceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO request_traces (id, method, route, actor_id, origin, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.method)
        .bind(&record.route)
        .bind(record.actor_id.map(|u| u.to_string()))
        .bind(&record.origin)
        .bind(format_db_timestamp(&record.created_at))
        .execute(self.pool)
        .await
        .context("Failed to insert request trace")?;

        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM request_traces")
            .fetch_one(self.pool)
            .await
            .context("Failed to count request traces")?;
        Ok(count)
    }
}
