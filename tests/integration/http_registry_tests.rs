//! HTTP reference registry tests against a mock lookup service

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pharmacy_registry::config::{RegistryBackend, RegistryConfig};
use pharmacy_registry::models::{IdentityKind, IdentityStatus};
use pharmacy_registry::services::{HttpReferenceRegistry, ReferenceRegistry, RegistryError};

fn registry_for(server: &MockServer, timeout_secs: u64) -> HttpReferenceRegistry {
    HttpReferenceRegistry::new(&RegistryConfig {
        backend: RegistryBackend::Http,
        url: format!("{}/", server.uri()),
        timeout_secs,
        max_connections: 1,
    })
    .unwrap()
}

#[tokio::test]
async fn test_person_lookup_parses_registry_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/people/11144477735"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document": "11144477735",
            "name": "Ana Souza",
            "status": "ATIVO",
            "city_code": "5300108"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let person = registry_for(&server, 2)
        .lookup_person("11144477735")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(person.kind, IdentityKind::Person);
    assert_eq!(person.status, IdentityStatus::Active);
    assert_eq!(person.city_code.as_deref(), Some("5300108"));
}

#[tokio::test]
async fn test_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legal-entities/45997418000153"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let found = registry_for(&server, 2)
        .lookup_legal_entity("45997418000153")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/5300108"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = registry_for(&server, 2)
        .lookup_city("5300108")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Transport(_)));
}

#[tokio::test]
async fn test_slow_registry_times_out_as_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legal-entities/11222333000181"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({
                    "document": "11222333000181",
                    "name": "Drogaria Central Ltda",
                    "status": "active"
                })),
        )
        .mount(&server)
        .await;

    let err = registry_for(&server, 1)
        .lookup_legal_entity("11222333000181")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Transport(_)));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/states/53"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = registry_for(&server, 2)
        .lookup_state("53")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_keys_stay_inside_their_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/people/11144477735"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document": "11144477735",
            "name": "Ana Souza",
            "status": "ATIVO"
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cities/1%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "1?x",
            "name": "Nowhere",
            "state_code": "53"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_for(&server, 2);
    let escaped = registry
        .lookup_city("../people/11144477735")
        .await
        .unwrap();
    assert!(escaped.is_none());

    let city = registry.lookup_city("1?x").await.unwrap().unwrap();
    assert_eq!(city.code, "1?x");
}
