//! Pharmacy establishment models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Brazilian postal code (CEP), with or without the hyphen
static POSTAL_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}-?\d{3}$").expect("postal code regex must compile"));

/// Operating status of an establishment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentStatus {
    #[default]
    Active,
    Inactive,
}

impl EstablishmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstablishmentStatus::Active => "active",
            EstablishmentStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EstablishmentStatus::Active),
            "inactive" => Some(EstablishmentStatus::Inactive),
            _ => None,
        }
    }
}

/// Street address of an establishment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 255))]
    pub street: String,
    #[validate(length(max = 20))]
    pub number: Option<String>,
    #[validate(length(max = 255))]
    pub complement: Option<String>,
    #[validate(length(max = 120))]
    pub district: Option<String>,
    /// Municipality code in the reference registry
    #[validate(length(min = 1, max = 7))]
    pub city_code: Option<String>,
    #[validate(regex(path = *POSTAL_CODE_REGEX))]
    pub postal_code: Option<String>,
}

/// A registered pharmacy establishment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Establishment {
    /// 14-digit company identifier, digits only
    pub cnpj: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub status: EstablishmentStatus,
    pub address: Address,
    /// 11-digit person identifier of the responsible pharmacist, digits only
    pub responsible_cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Establishment {
    pub fn is_active(&self) -> bool {
        self.status == EstablishmentStatus::Active
    }

    /// Apply a patch. Absent fields are left untouched; an explicit `null`
    /// clears an optional field.
    pub fn apply(&mut self, patch: &EstablishmentPatch) {
        if let Some(ref legal_name) = patch.legal_name {
            self.legal_name = legal_name.clone();
        }
        if let Some(ref trade_name) = patch.trade_name {
            self.trade_name = trade_name.clone();
        }
        if let Some(ref address) = patch.address {
            self.address = address.clone();
        }
        if let Some(ref cpf) = patch.responsible_cpf {
            self.responsible_cpf = cpf.clone();
        }
        if let Some(ref phone) = patch.phone {
            self.phone = phone.clone();
        }
        if let Some(ref email) = patch.email {
            self.email = email.clone();
        }
    }

    /// Bump `updated_at` so it always moves forward, even when the clock
    /// has not advanced since the previous write.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at + chrono::Duration::milliseconds(1);
        self.updated_at = if now > self.updated_at { now } else { floor };
    }
}

/// Request to register a new establishment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewEstablishment {
    pub cnpj: String,
    #[validate(length(min = 1, max = 255))]
    pub legal_name: String,
    #[validate(length(max = 255))]
    pub trade_name: Option<String>,
    #[validate(nested)]
    pub address: Address,
    pub responsible_cpf: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

/// Partial update of an establishment; the identifier and status are not patchable.
///
/// Optional fields take three shapes: absent (keep), `null` (clear) or a value.
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct EstablishmentPatch {
    #[validate(length(min = 1, max = 255))]
    pub legal_name: Option<String>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub trade_name: Option<Option<String>>,
    #[validate(nested)]
    pub address: Option<Address>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub responsible_cpf: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 30))]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<Option<String>>,
}

impl EstablishmentPatch {
    /// Responsible pharmacist this patch assigns, if any
    pub fn assigned_cpf(&self) -> Option<&str> {
        self.responsible_cpf.as_ref().and_then(Option::as_deref)
    }
}

/// A present field, `null` included, deserializes to `Some`.
fn clearable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
