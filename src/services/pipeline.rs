//! Establishment mutation pipeline
//!
//! Every mutation runs the same sequence:
//!
//! 1. resolve the session to (actor, active organization, role)
//! 2. require the operation's capability
//! 3. validate document checksums, before touching any store
//! 4. confirm identities against the reference registry
//! 5. load current state inside a unit of work (update/deactivate/reactivate)
//! 6. snapshot before/after
//! 7. write the new state and one audit record, then commit
//!
//! Registry lookups happen before the transaction opens and are not
//! re-checked inside it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::db::{self, bounded, AuditRepository, DbPool, EstablishmentRepository, UnitOfWork};
use crate::models::{
    ActorContext, AuditAction, AuditRecord, Capability, CityRecord, Establishment,
    EstablishmentPatch, EstablishmentStatus, IdentityRecord, NewEstablishment, ResolvedActor,
};
use crate::services::audit::{self, AuditRecorder};
use crate::services::rbac::AccessGuard;
use crate::services::registry::{ReferenceRegistry, RegistryError};
use crate::utils::validation::{normalize_digits, validate_company_id, validate_person_id};
use crate::utils::PipelineError;

pub struct MutationPipeline {
    db: DbPool,
    registry: Arc<dyn ReferenceRegistry>,
    guard: AccessGuard,
    audit: AuditRecorder,
    store_timeout: Duration,
}

impl MutationPipeline {
    pub fn new(db: DbPool, registry: Arc<dyn ReferenceRegistry>, store_timeout: Duration) -> Self {
        Self {
            guard: AccessGuard::new(db.clone(), store_timeout),
            audit: AuditRecorder::new(),
            db,
            registry,
            store_timeout,
        }
    }

    /// Register a new establishment in the `Active` state
    pub async fn create(
        &self,
        input: NewEstablishment,
        ctx: &ActorContext,
    ) -> Result<Establishment, PipelineError> {
        let actor = self.guard.authorize(ctx, Capability::Write).await?;

        let cnpj = require_company_id(&input.cnpj)?;
        let responsible_cpf = input
            .responsible_cpf
            .as_deref()
            .map(require_person_id)
            .transpose()?;

        self.confirm_identities(
            &cnpj,
            responsible_cpf.as_deref(),
            input.address.city_code.as_deref(),
        )
        .await?;

        let now = db::now();
        let record = Establishment {
            cnpj,
            legal_name: input.legal_name,
            trade_name: input.trade_name,
            status: EstablishmentStatus::Active,
            address: input.address,
            responsible_cpf,
            phone: input.phone,
            email: input.email,
            created_at: now,
            updated_at: now,
        };
        let after = audit::snapshot(&record)?;

        let mut uow = UnitOfWork::begin(&self.db, self.store_timeout).await?;
        uow.insert_establishment(&record).await?;
        self.audit
            .record(&mut uow, AuditAction::Create, &record.cnpj, &actor, None, after)
            .await?;
        uow.commit().await?;

        info!(
            cnpj = %record.cnpj,
            actor_id = %actor.actor_id,
            organization_id = %actor.organization_id,
            "Establishment created"
        );
        Ok(record)
    }

    /// Apply a partial update
    pub async fn update(
        &self,
        id: &str,
        mut patch: EstablishmentPatch,
        ctx: &ActorContext,
    ) -> Result<Establishment, PipelineError> {
        let actor = self.guard.authorize(ctx, Capability::Write).await?;

        let cnpj = require_company_id(id)?;
        if let Some(Some(cpf)) = patch.responsible_cpf.as_mut() {
            *cpf = require_person_id(cpf)?;
        }

        let city_code = patch.address.as_ref().and_then(|a| a.city_code.as_deref());
        self.confirm_identities(&cnpj, patch.assigned_cpf(), city_code)
            .await?;

        self.transition(&actor, &cnpj, AuditAction::Update, |record| {
            record.apply(&patch)
        })
        .await
    }

    /// Move an establishment to `Inactive`. Deactivating an inactive record
    /// succeeds and is still audited.
    pub async fn deactivate(
        &self,
        id: &str,
        ctx: &ActorContext,
    ) -> Result<Establishment, PipelineError> {
        self.set_status(id, ctx, AuditAction::Deactivate, EstablishmentStatus::Inactive)
            .await
    }

    /// Move an establishment back to `Active`
    pub async fn reactivate(
        &self,
        id: &str,
        ctx: &ActorContext,
    ) -> Result<Establishment, PipelineError> {
        self.set_status(id, ctx, AuditAction::Reactivate, EstablishmentStatus::Active)
            .await
    }

    /// Plain read of one establishment
    pub async fn get(&self, id: &str, ctx: &ActorContext) -> Result<Establishment, PipelineError> {
        self.guard.authorize(ctx, Capability::View).await?;
        let cnpj = require_company_id(id)?;

        let pool = &self.db;
        let found = bounded(self.store_timeout, "get establishment", async {
            EstablishmentRepository::new(pool)
                .get_by_cnpj(&cnpj)
                .await
                .map_err(|e| PipelineError::TransportFailure(e.to_string()))
        })
        .await?;

        found.ok_or(PipelineError::NotFound(cnpj))
    }

    /// Audit trail of one establishment, oldest first
    pub async fn history(
        &self,
        id: &str,
        ctx: &ActorContext,
    ) -> Result<Vec<AuditRecord>, PipelineError> {
        self.guard.authorize(ctx, Capability::Admin).await?;
        let cnpj = require_company_id(id)?;

        let pool = &self.db;
        bounded(self.store_timeout, "list audit records", async {
            AuditRepository::new(pool)
                .list_for_target(&cnpj)
                .await
                .map_err(|e| PipelineError::TransportFailure(e.to_string()))
        })
        .await
    }

    /// Plain read of a person in the reference registry
    pub async fn person(
        &self,
        id: &str,
        ctx: &ActorContext,
    ) -> Result<Option<IdentityRecord>, PipelineError> {
        self.guard.authorize(ctx, Capability::View).await?;
        let cpf = require_person_id(id)?;
        self.registry
            .lookup_person(&cpf)
            .await
            .map_err(registry_failure)
    }

    /// Plain read of a legal entity in the reference registry
    pub async fn legal_entity(
        &self,
        id: &str,
        ctx: &ActorContext,
    ) -> Result<Option<IdentityRecord>, PipelineError> {
        self.guard.authorize(ctx, Capability::View).await?;
        let cnpj = require_company_id(id)?;
        self.registry
            .lookup_legal_entity(&cnpj)
            .await
            .map_err(registry_failure)
    }

    /// Plain read of a city in the reference registry
    pub async fn city(
        &self,
        code: &str,
        ctx: &ActorContext,
    ) -> Result<Option<CityRecord>, PipelineError> {
        self.guard.authorize(ctx, Capability::View).await?;
        self.registry
            .lookup_city(code.trim())
            .await
            .map_err(registry_failure)
    }

    async fn set_status(
        &self,
        id: &str,
        ctx: &ActorContext,
        action: AuditAction,
        status: EstablishmentStatus,
    ) -> Result<Establishment, PipelineError> {
        let actor = self.guard.authorize(ctx, Capability::Admin).await?;
        let cnpj = require_company_id(id)?;
        self.confirm_identities(&cnpj, None, None).await?;

        self.transition(&actor, &cnpj, action, |record| record.status = status)
            .await
    }

    /// Load, mutate, and commit one existing record together with its audit
    /// record. The audit record is written even when nothing changed.
    async fn transition<F>(
        &self,
        actor: &ResolvedActor,
        cnpj: &str,
        action: AuditAction,
        mutate: F,
    ) -> Result<Establishment, PipelineError>
    where
        F: FnOnce(&mut Establishment),
    {
        let mut uow = UnitOfWork::begin(&self.db, self.store_timeout).await?;

        let mut record = uow
            .load_establishment(cnpj)
            .await?
            .ok_or_else(|| PipelineError::NotFound(cnpj.to_string()))?;
        let before = audit::snapshot(&record)?;

        mutate(&mut record);
        record.touch(db::now());
        let after = audit::snapshot(&record)?;

        uow.update_establishment(&record).await?;
        let entry = self
            .audit
            .record(&mut uow, action, cnpj, actor, Some(before), after)
            .await?;
        uow.commit().await?;

        info!(
            cnpj = %cnpj,
            action = action.as_str(),
            actor_id = %actor.actor_id,
            changed = ?entry.changed_fields,
            "Establishment mutation committed"
        );
        Ok(record)
    }

    /// The company must be an active legal entity. A supplied responsible
    /// person must be an active person, and a supplied city must exist.
    async fn confirm_identities(
        &self,
        cnpj: &str,
        responsible_cpf: Option<&str>,
        city_code: Option<&str>,
    ) -> Result<(), PipelineError> {
        let entity = self
            .registry
            .lookup_legal_entity(cnpj)
            .await
            .map_err(registry_failure)?;
        require_active(entity, "legal_entity", cnpj)?;

        if let Some(cpf) = responsible_cpf {
            let person = self
                .registry
                .lookup_person(cpf)
                .await
                .map_err(registry_failure)?;
            require_active(person, "person", cpf)?;
        }

        if let Some(code) = city_code {
            let city = self
                .registry
                .lookup_city(code)
                .await
                .map_err(registry_failure)?;
            if city.is_none() {
                return Err(PipelineError::UnknownIdentity {
                    kind: "city",
                    id: code.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn require_company_id(raw: &str) -> Result<String, PipelineError> {
    if validate_company_id(raw) {
        Ok(normalize_digits(raw))
    } else {
        Err(PipelineError::InvalidDocument {
            field: "cnpj",
            value: raw.to_string(),
        })
    }
}

fn require_person_id(raw: &str) -> Result<String, PipelineError> {
    if validate_person_id(raw) {
        Ok(normalize_digits(raw))
    } else {
        Err(PipelineError::InvalidDocument {
            field: "cpf",
            value: raw.to_string(),
        })
    }
}

fn require_active(
    record: Option<IdentityRecord>,
    kind: &'static str,
    id: &str,
) -> Result<(), PipelineError> {
    match record {
        None => Err(PipelineError::UnknownIdentity {
            kind,
            id: id.to_string(),
        }),
        Some(r) if !r.is_active() => Err(PipelineError::InactiveIdentity {
            kind,
            id: id.to_string(),
            status: r.status.as_str(),
        }),
        Some(_) => Ok(()),
    }
}

fn registry_failure(err: RegistryError) -> PipelineError {
    warn!(error = %err, "Reference registry unavailable");
    PipelineError::TransportFailure(err.to_string())
}
