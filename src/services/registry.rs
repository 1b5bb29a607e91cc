//! Reference registry client
//!
//! Read-only point lookups against the external civil/commercial registry.
//! "Not found" is `Ok(None)`; failing to reach the registry is a
//! [`RegistryError`], which callers must treat as retryable.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{RegistryBackend, RegistryConfig};
use crate::models::{CityRecord, IdentityRecord, StateRecord};
use crate::services::{HttpReferenceRegistry, SqlReferenceRegistry};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry unreachable or timed out
    #[error("reference registry transport error: {0}")]
    Transport(String),

    /// Registry answered with something we cannot interpret
    #[error("reference registry returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ReferenceRegistry: Send + Sync {
    async fn lookup_person(&self, cpf: &str) -> Result<Option<IdentityRecord>, RegistryError>;

    async fn lookup_legal_entity(&self, cnpj: &str)
        -> Result<Option<IdentityRecord>, RegistryError>;

    async fn lookup_city(&self, code: &str) -> Result<Option<CityRecord>, RegistryError>;

    async fn lookup_state(&self, code: &str) -> Result<Option<StateRecord>, RegistryError>;
}

/// Build the configured registry backend
pub async fn connect(config: &RegistryConfig) -> Result<Arc<dyn ReferenceRegistry>> {
    match config.backend {
        RegistryBackend::Sql => {
            info!("Connecting to SQL reference registry (read-only)");
            let registry = SqlReferenceRegistry::connect(config)
                .await
                .context("Failed to open reference registry database")?;
            Ok(Arc::new(registry))
        }
        RegistryBackend::Http => {
            info!("Using HTTP reference registry at {}", config.url);
            let registry =
                HttpReferenceRegistry::new(config).context("Failed to build registry client")?;
            Ok(Arc::new(registry))
        }
    }
}
