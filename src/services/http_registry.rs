//! HTTP-backed reference registry
//!
//! Talks to a JSON lookup service exposing:
//! - `GET {base}/people/{cpf}`
//! - `GET {base}/legal-entities/{cnpj}`
//! - `GET {base}/cities/{code}`
//! - `GET {base}/states/{code}`
//!
//! A 404 means "not registered". Anything else that is not a 2xx is a
//! transport-level failure. Keys are percent-encoded as single path
//! segments, so a key can never address another resource.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::registry::{ReferenceRegistry, RegistryError};
use crate::config::RegistryConfig;
use crate::models::{CityRecord, IdentityKind, IdentityRecord, IdentityStatus, StateRecord};

/// Identity payload as served by the registry
#[derive(Debug, Deserialize)]
struct IdentityPayload {
    document: String,
    name: String,
    status: String,
    #[serde(default)]
    city_code: Option<String>,
}

#[derive(Clone)]
pub struct HttpReferenceRegistry {
    client: Client,
    base_url: Url,
}

impl HttpReferenceRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(&config.url)
            .with_context(|| format!("Invalid reference registry URL: {}", config.url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Reference registry URL cannot take a path: {}", config.url);
        }

        Ok(Self { client, base_url })
    }

    /// `{base}/{collection}/{key}` with `key` encoded as one segment
    fn endpoint(&self, collection: &str, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(collection).push(key);
        }
        url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<T>, RegistryError> {
        let url = self.endpoint(collection, key);
        debug!("Reference registry GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Reference registry request failed");
            if e.is_timeout() {
                RegistryError::Transport(format!("request to {} timed out", url))
            } else {
                RegistryError::Transport(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<T>()
                    .await
                    .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
                Ok(Some(body))
            }
            status => {
                warn!(url = %url, status = %status, "Reference registry returned an error");
                Err(RegistryError::Transport(format!(
                    "registry responded with {}",
                    status
                )))
            }
        }
    }
}

#[async_trait]
impl ReferenceRegistry for HttpReferenceRegistry {
    async fn lookup_person(&self, cpf: &str) -> Result<Option<IdentityRecord>, RegistryError> {
        let payload = self
            .get::<IdentityPayload>("people", cpf)
            .await?;
        Ok(payload.map(|p| payload_to_identity(p, IdentityKind::Person)))
    }

    async fn lookup_legal_entity(
        &self,
        cnpj: &str,
    ) -> Result<Option<IdentityRecord>, RegistryError> {
        let payload = self
            .get::<IdentityPayload>("legal-entities", cnpj)
            .await?;
        Ok(payload.map(|p| payload_to_identity(p, IdentityKind::LegalEntity)))
    }

    async fn lookup_city(&self, code: &str) -> Result<Option<CityRecord>, RegistryError> {
        self.get::<CityRecord>("cities", code).await
    }

    async fn lookup_state(&self, code: &str) -> Result<Option<StateRecord>, RegistryError> {
        self.get::<StateRecord>("states", code).await
    }
}

fn payload_to_identity(payload: IdentityPayload, kind: IdentityKind) -> IdentityRecord {
    IdentityRecord {
        document: payload.document,
        kind,
        name: payload.name,
        status: IdentityStatus::parse(&payload.status),
        city_code: payload.city_code,
    }
}
