//! Common step definitions used across features

use cucumber::{given, then};

use pharmacy_registry::models::MembershipRole;

use crate::common::MockError;
use crate::features::support::TestWorld;

#[given("a clean registry")]
async fn clean_registry(world: &mut TestWorld) {
    world.start().await;
}

#[given(expr = "I am signed in as {word}")]
async fn signed_in_as(world: &mut TestWorld, role: String) {
    let role = MembershipRole::parse(&role).unwrap_or_else(|| panic!("unknown role {role}"));
    world.sign_in(role).await;
}

#[given("I am not signed in")]
async fn not_signed_in(world: &mut TestWorld) {
    world.auth_token = None;
}

#[given("the reference registry is unreachable")]
async fn registry_unreachable(world: &mut TestWorld) {
    world.app().registry.set_error_mode(MockError::Unreachable);
}

#[then(expr = "the response status should be {int}")]
async fn response_status(world: &mut TestWorld, status: u16) {
    let response = world.last_response();
    assert_eq!(response.status, status, "body: {}", response.body);
}

#[then(expr = "the error should be {string}")]
async fn error_tag(world: &mut TestWorld, tag: String) {
    assert_eq!(world.last_response().body["error"], tag.as_str());
}

#[then("the request may be retried")]
async fn retryable(world: &mut TestWorld) {
    assert_eq!(world.last_response().body["retryable"], true);
}
