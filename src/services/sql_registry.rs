//! SQL-backed reference registry
//!
//! Reads the registry database over a dedicated read-only pool. The schema
//! belongs to the registry owner; this module only assumes these tables:
//!
//! - `people (cpf, name, status, city_code)`
//! - `legal_entities (cnpj, legal_name, status, city_code)`
//! - `cities (code, name, state_code)`
//! - `states (code, abbreviation, name)`

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

use super::registry::{ReferenceRegistry, RegistryError};
use crate::config::RegistryConfig;
use crate::models::{CityRecord, IdentityKind, IdentityRecord, IdentityStatus, StateRecord};

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    document: String,
    name: String,
    status: String,
    city_code: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct CityRow {
    code: String,
    name: String,
    state_code: String,
}

#[derive(Debug, sqlx::FromRow)]
struct StateRow {
    code: String,
    abbreviation: String,
    name: String,
}

#[derive(Clone)]
pub struct SqlReferenceRegistry {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqlReferenceRegistry {
    /// Wrap an existing pool
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Open a read-only pool on the configured registry database
    pub async fn connect(config: &RegistryConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid registry URL: {}", config.url))?
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.timeout())
            .connect_with(options)
            .await
            .context("Failed to connect to reference registry")?;

        Ok(Self::new(pool, config.timeout()))
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(lookup = what, error = %err, "Reference registry query failed");
                Err(RegistryError::Transport(err.to_string()))
            }
            Err(_) => Err(RegistryError::Transport(format!(
                "{} timed out after {}ms",
                what,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl ReferenceRegistry for SqlReferenceRegistry {
    async fn lookup_person(&self, cpf: &str) -> Result<Option<IdentityRecord>, RegistryError> {
        let row = self
            .bounded(
                "person lookup",
                sqlx::query_as::<_, IdentityRow>(
                    r#"
                    SELECT cpf AS document, name, status, city_code
                    FROM people
                    WHERE cpf = ?
                    "#,
                )
                .bind(cpf)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|r| row_to_identity(r, IdentityKind::Person)))
    }

    async fn lookup_legal_entity(
        &self,
        cnpj: &str,
    ) -> Result<Option<IdentityRecord>, RegistryError> {
        let row = self
            .bounded(
                "legal entity lookup",
                sqlx::query_as::<_, IdentityRow>(
                    r#"
                    SELECT cnpj AS document, legal_name AS name, status, city_code
                    FROM legal_entities
                    WHERE cnpj = ?
                    "#,
                )
                .bind(cnpj)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|r| row_to_identity(r, IdentityKind::LegalEntity)))
    }

    async fn lookup_city(&self, code: &str) -> Result<Option<CityRecord>, RegistryError> {
        let row = self
            .bounded(
                "city lookup",
                sqlx::query_as::<_, CityRow>(
                    "SELECT code, name, state_code FROM cities WHERE code = ?",
                )
                .bind(code)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|r| CityRecord {
            code: r.code,
            name: r.name,
            state_code: r.state_code,
        }))
    }

    async fn lookup_state(&self, code: &str) -> Result<Option<StateRecord>, RegistryError> {
        let row = self
            .bounded(
                "state lookup",
                sqlx::query_as::<_, StateRow>(
                    "SELECT code, abbreviation, name FROM states WHERE code = ?",
                )
                .bind(code)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|r| StateRecord {
            code: r.code,
            abbreviation: r.abbreviation,
            name: r.name,
        }))
    }
}

fn row_to_identity(row: IdentityRow, kind: IdentityKind) -> IdentityRecord {
    IdentityRecord {
        document: row.document,
        kind,
        name: row.name,
        status: IdentityStatus::parse(&row.status),
        city_code: row.city_code,
    }
}
