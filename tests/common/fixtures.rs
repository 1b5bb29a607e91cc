//! Test fixtures for common test data
//!
//! Fixtures provide pre-defined test data that can be used across multiple tests.

use uuid::Uuid;

use pharmacy_registry::db::{DbPool, OrganizationRepository};
use pharmacy_registry::models::{
    ActorContext, Address, CreateOrganizationRequest, EstablishmentPatch, IdentityStatus,
    MembershipRole, NewEstablishment,
};

use super::mocks::MockRegistry;

/// Documents known to the seeded registry
pub mod docs {
    /// Active legal entity
    pub const PHARMACY_CNPJ: &str = "11222333000181";
    /// Same company, masked
    pub const PHARMACY_CNPJ_MASKED: &str = "11.222.333/0001-81";
    /// Second active legal entity
    pub const BRANCH_CNPJ: &str = "11444777000161";
    /// Legal entity registered as suspended
    pub const SUSPENDED_CNPJ: &str = "06990590000123";
    /// Valid checksum, absent from the registry
    pub const UNREGISTERED_CNPJ: &str = "45997418000153";
    /// Checksum failure
    pub const BAD_CNPJ: &str = "11222333000180";

    /// Active pharmacist
    pub const PHARMACIST_CPF: &str = "11144477735";
    /// Second active pharmacist
    pub const RELIEF_PHARMACIST_CPF: &str = "52998224725";
    /// Person registered as inactive
    pub const INACTIVE_CPF: &str = "39053344705";
    /// Checksum failure
    pub const BAD_CPF: &str = "11144477736";

    pub const BRASILIA: &str = "5300108";
    pub const UNKNOWN_CITY: &str = "9999999";
}

/// Registry seeded with the documents in [`docs`]
pub fn seeded_registry() -> MockRegistry {
    MockRegistry::new()
        .with_legal_entity(docs::PHARMACY_CNPJ, "Drogaria Central Ltda", IdentityStatus::Active)
        .with_legal_entity(docs::BRANCH_CNPJ, "Farmácia Filial Ltda", IdentityStatus::Active)
        .with_legal_entity(
            docs::SUSPENDED_CNPJ,
            "Farmácia Suspensa Ltda",
            IdentityStatus::Suspended,
        )
        .with_person(docs::PHARMACIST_CPF, "Ana Souza", IdentityStatus::Active)
        .with_person(docs::RELIEF_PHARMACIST_CPF, "Bruno Lima", IdentityStatus::Active)
        .with_person(docs::INACTIVE_CPF, "Carlos Dias", IdentityStatus::Inactive)
        .with_city(docs::BRASILIA, "Brasília", "53")
        .with_state("53", "DF", "Distrito Federal")
}

/// Establishment creation input for the main seeded pharmacy
pub fn new_pharmacy() -> NewEstablishment {
    NewEstablishment {
        cnpj: docs::PHARMACY_CNPJ.to_string(),
        legal_name: "Drogaria Central Ltda".to_string(),
        trade_name: Some("Drogaria Central".to_string()),
        address: Address {
            street: "SCS Quadra 2".to_string(),
            number: Some("10".to_string()),
            complement: None,
            district: Some("Asa Sul".to_string()),
            city_code: Some(docs::BRASILIA.to_string()),
            postal_code: Some("70302-000".to_string()),
        },
        responsible_cpf: Some(docs::PHARMACIST_CPF.to_string()),
        phone: Some("+55 61 3322-1100".to_string()),
        email: Some("contato@drogariacentral.com.br".to_string()),
    }
}

/// Patch changing the trade name only
pub fn rename_patch(trade_name: &str) -> EstablishmentPatch {
    EstablishmentPatch {
        trade_name: Some(Some(trade_name.to_string())),
        ..Default::default()
    }
}

/// Create an organization and give a fresh actor `role` in it
pub async fn seed_actor(pool: &DbPool, role: MembershipRole) -> ActorContext {
    let organization_id = seed_organization(pool).await;
    let actor_id = Uuid::new_v4();
    OrganizationRepository::new(pool)
        .set_member(organization_id, actor_id, role)
        .await
        .expect("Failed to seed membership");
    ActorContext::new(actor_id, Some(organization_id)).with_origin("198.51.100.20")
}

pub async fn seed_organization(pool: &DbPool) -> Uuid {
    let slug = format!("org-{}", Uuid::new_v4().simple());
    OrganizationRepository::new(pool)
        .create(&CreateOrganizationRequest {
            name: format!("Organization {}", slug),
            slug,
        })
        .await
        .expect("Failed to seed organization")
        .id
}
