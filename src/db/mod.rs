//! Database layer
//!
//! This module handles the operational store:
//! - Establishment records
//! - Append-only audit records and request traces
//! - Organizations and memberships
//!
//! Writes that must land together go through [`UnitOfWork`].

pub mod audit_repository;
pub mod establishment_repository;
pub mod organization_repository;
pub mod trace_repository;
pub mod unit_of_work;

pub use audit_repository::AuditRepository;
pub use establishment_repository::EstablishmentRepository;
pub use organization_repository::OrganizationRepository;
pub use trace_repository::TraceRepository;
pub use unit_of_work::UnitOfWork;

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};

use crate::config::DatabaseConfig;
use crate::utils::PipelineError;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

/// Initialize the operational store pool and run migrations
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid database URL: {}", config.url))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(config.connect_timeout_secs))
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

    // An in-memory database disappears with its last connection.
    if is_memory_url(&config.url) {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    } else {
        pool_options = pool_options.idle_timeout(Duration::from_secs(config.idle_timeout_secs));
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to operational database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Check that the operational store answers a trivial query
pub async fn check_health(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database health check failed")?;
    Ok(())
}

pub(crate) fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Current time at the precision the store keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_db_timestamp(ts: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
    }
    Utc::now()
}

/// Run a store call under a deadline; expiry is a transport failure.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::TransportFailure(format!(
            "{} timed out after {}ms",
            what,
            limit.as_millis()
        ))),
    }
}

/// Map a failed read to a pipeline error. Reads change nothing, so every
/// failure is reported as retryable transport trouble.
pub(crate) fn read_error(err: sqlx::Error) -> PipelineError {
    PipelineError::TransportFailure(err.to_string())
}

/// Map a failed write inside the unit of work.
pub(crate) fn write_error(err: sqlx::Error) -> PipelineError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PipelineError::TransportFailure(err.to_string())
        }
        other => PipelineError::ConflictOnCommit(other.to_string()),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}
