//! Transactional unit of work
//!
//! Everything written through a `UnitOfWork` becomes visible together on
//! [`UnitOfWork::commit`], or not at all. Dropping it without committing
//! rolls the transaction back.

use std::time::Duration;

use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::{audit_repository, bounded, establishment_repository, read_error, write_error, DbPool};
use crate::models::{AuditRecord, Establishment};
use crate::utils::PipelineError;

pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    timeout: Duration,
}

impl UnitOfWork {
    /// Open a write transaction on the operational store.
    ///
    /// The write lock is taken up front with `BEGIN IMMEDIATE`, so concurrent
    /// units queue on the busy timeout instead of failing the lock upgrade
    /// after their first read.
    pub async fn begin(pool: &DbPool, timeout: Duration) -> Result<Self, PipelineError> {
        let tx = bounded(timeout, "begin transaction", async {
            pool.begin_with("BEGIN IMMEDIATE").await.map_err(read_error)
        })
        .await?;

        Ok(Self { tx, timeout })
    }

    pub async fn load_establishment(
        &mut self,
        cnpj: &str,
    ) -> Result<Option<Establishment>, PipelineError> {
        let tx = &mut self.tx;
        bounded(self.timeout, "load establishment", async move {
            establishment_repository::fetch(&mut **tx, cnpj)
                .await
                .map_err(read_error)
        })
        .await
    }

    pub async fn insert_establishment(&mut self, record: &Establishment) -> Result<(), PipelineError> {
        let tx = &mut self.tx;
        bounded(self.timeout, "insert establishment", async move {
            establishment_repository::insert(&mut **tx, record)
                .await
                .map_err(|err| {
                    if super::is_unique_violation(&err) {
                        PipelineError::AlreadyExists(record.cnpj.clone())
                    } else {
                        write_error(err)
                    }
                })
        })
        .await
    }

    pub async fn update_establishment(&mut self, record: &Establishment) -> Result<(), PipelineError> {
        let tx = &mut self.tx;
        let touched = bounded(self.timeout, "update establishment", async move {
            establishment_repository::update(&mut **tx, record)
                .await
                .map_err(write_error)
        })
        .await?;

        if touched == 0 {
            return Err(PipelineError::NotFound(record.cnpj.clone()));
        }
        Ok(())
    }

    /// Append an audit record to this transaction
    pub async fn append_audit(&mut self, record: &AuditRecord) -> Result<(), PipelineError> {
        let tx = &mut self.tx;
        bounded(self.timeout, "append audit record", async move {
            audit_repository::insert(&mut **tx, record)
                .await
                .map_err(write_error)
        })
        .await
    }

    /// Make every write of this unit visible.
    ///
    /// Not bounded by the statement deadline: abandoning the wait could
    /// report a failure for a commit SQLite already applied.
    pub async fn commit(self) -> Result<(), PipelineError> {
        self.tx.commit().await.map_err(write_error)?;
        debug!("Unit of work committed");
        Ok(())
    }
}
