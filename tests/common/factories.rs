//! Test factories for generating test data
//!
//! Factories create randomized test data for when each test needs its own
//! establishment without clashing with the fixed fixtures.

use fake::faker::address::en::StreetName;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;

use pharmacy_registry::models::{Address, IdentityStatus, NewEstablishment};
use pharmacy_registry::utils::validation::{validate_company_id, validate_person_id};

use super::fixtures::docs;
use super::mocks::MockRegistry;

/// Random company id with valid check digits
pub fn company_id() -> String {
    with_check_digits(12, validate_company_id)
}

/// Random person id with valid check digits
pub fn person_id() -> String {
    with_check_digits(9, validate_person_id)
}

/// Append the two digits that make `base` pass `is_valid`
fn with_check_digits(len: usize, is_valid: fn(&str) -> bool) -> String {
    loop {
        let base: String = (0..len)
            .map(|_| char::from(b'0' + (0..10u8).fake::<u8>()))
            .collect();
        if let Some(id) = (0..100)
            .map(|n| format!("{}{:02}", base, n))
            .find(|candidate| is_valid(candidate))
        {
            return id;
        }
    }
}

/// Factory for establishments whose company is registered and active
pub struct EstablishmentFactory;

impl EstablishmentFactory {
    /// Build creation input and register the company in `registry`
    pub fn create(registry: &MockRegistry) -> NewEstablishment {
        let cnpj = company_id();
        let legal_name: String = CompanyName().fake();
        registry.add_legal_entity(&cnpj, &legal_name, IdentityStatus::Active);

        NewEstablishment {
            cnpj,
            legal_name,
            trade_name: None,
            address: Address {
                street: StreetName().fake(),
                number: Some((1..2000u32).fake::<u32>().to_string()),
                city_code: Some(docs::BRASILIA.to_string()),
                ..Default::default()
            },
            responsible_cpf: Some(docs::PHARMACIST_CPF.to_string()),
            phone: None,
            email: Some(SafeEmail().fake()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        for _ in 0..20 {
            assert!(validate_company_id(&company_id()));
            assert!(validate_person_id(&person_id()));
        }
    }
}
