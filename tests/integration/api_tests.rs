//! API integration tests
//!
//! Exercise the HTTP surface end to end: session middleware, handlers,
//! error mapping and request tracing.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use pharmacy_registry::db::TraceRepository;
use pharmacy_registry::models::MembershipRole;

use crate::common::*;

fn pharmacy_body() -> serde_json::Value {
    serde_json::to_value(new_pharmacy()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_detailed_health_endpoint() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health/detailed").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["components"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_create_without_token_is_unauthenticated() {
    let app = TestApp::new().await;
    let response = app.post_json("/api/v1/establishments", pharmacy_body()).await;

    response.assert_unauthorized();
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], "unauthenticated");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post_json_as("/api/v1/establishments", pharmacy_body(), "not-a-jwt")
        .await;

    response.assert_unauthorized();
}

#[tokio::test]
async fn test_establishment_lifecycle_over_http() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(MembershipRole::Admin).await;

    let response = app
        .post_json_as("/api/v1/establishments", pharmacy_body(), &token)
        .await;
    response.assert_created();
    let created: serde_json::Value = response.json();
    assert_eq!(created["cnpj"], docs::PHARMACY_CNPJ);
    assert_eq!(created["status"], "active");

    let uri = format!("/api/v1/establishments/{}", docs::PHARMACY_CNPJ);
    let response = app
        .put_json_as(&uri, json!({ "trade_name": "Drogaria Central 24h" }), &token)
        .await;
    response.assert_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["trade_name"], "Drogaria Central 24h");
    assert_eq!(updated["legal_name"], "Drogaria Central Ltda");

    let response = app.post_as(&format!("{}/deactivate", uri), &token).await;
    response.assert_ok();
    let deactivated: serde_json::Value = response.json();
    assert_eq!(deactivated["status"], "inactive");

    let response = app.get_as(&uri, &token).await;
    response.assert_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "inactive");

    let response = app.get_as(&format!("{}/audit", uri), &token).await;
    response.assert_ok();
    let audit: Vec<serde_json::Value> = response.json();
    let actions: Vec<_> = audit.iter().map(|a| a["action"].clone()).collect();
    assert_eq!(actions, vec!["create", "update", "deactivate"]);
    assert_eq!(audit[1]["before"]["trade_name"], "Drogaria Central");
    assert_eq!(audit[1]["after"]["trade_name"], "Drogaria Central 24h");
}

#[tokio::test]
async fn test_pipeline_errors_map_to_statuses() {
    let app = TestApp::new().await;
    let (_, member) = app.token_for(MembershipRole::Member).await;

    let mut body = pharmacy_body();
    body["cnpj"] = json!(docs::BAD_CNPJ);
    let response = app
        .post_json_as("/api/v1/establishments", body, &member)
        .await;
    response.assert_unprocessable();
    assert_eq!(
        response.json::<serde_json::Value>()["error"],
        "invalid_document"
    );

    let mut body = pharmacy_body();
    body["cnpj"] = json!(docs::UNREGISTERED_CNPJ);
    app.post_json_as("/api/v1/establishments", body, &member)
        .await
        .assert_unprocessable();

    app.post_json_as("/api/v1/establishments", pharmacy_body(), &member)
        .await
        .assert_created();
    let response = app
        .post_json_as("/api/v1/establishments", pharmacy_body(), &member)
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], "already_exists");
    assert!(json.get("retryable").is_none());

    let deactivate = format!(
        "/api/v1/establishments/{}/deactivate",
        docs::PHARMACY_CNPJ
    );
    app.post_as(&deactivate, &member).await.assert_forbidden();

    let missing = format!("/api/v1/establishments/{}", docs::BRANCH_CNPJ);
    app.get_as(&missing, &member).await.assert_not_found();
}

#[tokio::test]
async fn test_registry_outage_is_retryable_503() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(MembershipRole::Member).await;
    app.registry.set_error_mode(MockError::Unreachable);

    let response = app
        .post_json_as("/api/v1/establishments", pharmacy_body(), &token)
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], "transport_failure");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn test_input_validation_is_unprocessable() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(MembershipRole::Member).await;

    let mut body = pharmacy_body();
    body["email"] = json!("not-an-email");
    body["address"]["postal_code"] = json!("123");
    let response = app
        .post_json_as("/api/v1/establishments", body, &token)
        .await;

    response.assert_unprocessable();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"]["email"][0]["code"], "email");
    assert_eq!(app.registry.lookup_count(), 0);
}

#[tokio::test]
async fn test_token_without_organization_is_forbidden() {
    let app = TestApp::new().await;
    let (mut ctx, _) = app.token_for(MembershipRole::Owner).await;
    ctx.active_organization_id = None;
    let token = generate_test_token(&app.state.config, &ctx);

    let response = app
        .post_json_as("/api/v1/establishments", pharmacy_body(), &token)
        .await;

    response.assert_forbidden();
    assert_eq!(
        response.json::<serde_json::Value>()["error"],
        "no_active_tenant"
    );
}

#[tokio::test]
async fn test_registry_lookup_endpoints() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(MembershipRole::Viewer).await;

    let response = app
        .get_as(
            &format!("/api/v1/registry/people/{}", docs::PHARMACIST_CPF),
            &token,
        )
        .await;
    response.assert_ok();
    let person = response.json::<serde_json::Value>();
    assert_eq!(person["name"], "Ana Souza");
    assert_eq!(person["document"], docs::PHARMACIST_CPF);
    assert_eq!(person["formatted_document"], "111.444.777-35");

    let response = app
        .get_as(
            &format!("/api/v1/registry/legal-entities/{}", docs::SUSPENDED_CNPJ),
            &token,
        )
        .await;
    response.assert_ok();
    let entity = response.json::<serde_json::Value>();
    assert_eq!(entity["status"], "suspended");
    assert_eq!(entity["formatted_document"], "06.990.590/0001-23");

    app.get_as(
        &format!("/api/v1/registry/legal-entities/{}", docs::UNREGISTERED_CNPJ),
        &token,
    )
    .await
    .assert_not_found();

    app.get_as(
        &format!("/api/v1/registry/cities/{}", docs::BRASILIA),
        &token,
    )
    .await
    .assert_ok();
}

#[tokio::test]
async fn test_requests_are_traced_with_matched_route() {
    let app = TestApp::new().await;
    let (ctx, token) = app.token_for(MembershipRole::Viewer).await;

    app.get_as(
        &format!("/api/v1/establishments/{}", docs::PHARMACY_CNPJ),
        &token,
    )
    .await
    .assert_not_found();

    let repo = TraceRepository::new(&app.state.db);
    let mut traced = 0;
    for _ in 0..50 {
        traced = repo.count().await.unwrap();
        if traced > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(traced, 1);

    let (route, actor): (String, Option<String>) =
        sqlx::query_as("SELECT route, actor_id FROM request_traces")
            .fetch_one(&app.state.db)
            .await
            .unwrap();
    assert_eq!(route, "/api/v1/establishments/{cnpj}");
    assert_eq!(actor, ctx.actor_id.map(|id| id.to_string()));
}
