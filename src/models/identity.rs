//! Reference registry models
//!
//! These records are owned by the external civil/commercial registry and are
//! only ever read by this service.

use serde::{Deserialize, Serialize};

use crate::utils::validation::{format_company_id, format_person_id};

/// Kind of registered identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Person,
    LegalEntity,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Person => "person",
            IdentityKind::LegalEntity => "legal_entity",
        }
    }
}

/// Registration status as reported by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    Active,
    Inactive,
    Suspended,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Active => "active",
            IdentityStatus::Inactive => "inactive",
            IdentityStatus::Suspended => "suspended",
        }
    }

    /// Parse a registry status value. Anything unrecognised is treated as
    /// inactive so it can never pass an "is active" check.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "ativa" | "ativo" => IdentityStatus::Active,
            "suspended" | "suspensa" | "suspenso" => IdentityStatus::Suspended,
            _ => IdentityStatus::Inactive,
        }
    }
}

/// Person or legal-entity master data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Digits-only document number (11 for persons, 14 for legal entities)
    pub document: String,
    pub kind: IdentityKind,
    pub name: String,
    pub status: IdentityStatus,
    /// Place of registration
    pub city_code: Option<String>,
}

impl IdentityRecord {
    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }

    /// Document number in its conventional display mask
    pub fn formatted_document(&self) -> Option<String> {
        match self.kind {
            IdentityKind::Person => format_person_id(&self.document),
            IdentityKind::LegalEntity => format_company_id(&self.document),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub code: String,
    pub name: String,
    pub state_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub code: String,
    /// Two-letter abbreviation (e.g. "SP")
    pub abbreviation: String,
    pub name: String,
}
