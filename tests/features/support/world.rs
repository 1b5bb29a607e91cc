//! Test world for Cucumber scenarios

use std::fmt;

use cucumber::World;

use pharmacy_registry::models::{ActorContext, MembershipRole};

use crate::common::{seed_actor, TestApp};

/// Test world that maintains state across scenario steps
#[derive(Default, World)]
pub struct TestWorld {
    /// Application under test, created by the background step
    pub app: Option<TestApp>,

    /// Session token of the current actor
    pub auth_token: Option<String>,

    /// Owner of a separate organization, used to inspect state
    pub observer: Option<ActorContext>,

    /// Response from last API call
    pub last_response: Option<TestResponse>,
}

impl fmt::Debug for TestWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestWorld")
            .field("started", &self.app.is_some())
            .field("authenticated", &self.auth_token.is_some())
            .field("last_response", &self.last_response)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TestResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl TestWorld {
    pub fn app(&self) -> &TestApp {
        self.app
            .as_ref()
            .expect("Background step 'a clean registry' has not run")
    }

    pub fn observer(&self) -> &ActorContext {
        self.observer
            .as_ref()
            .expect("Background step 'a clean registry' has not run")
    }

    /// Start a fresh application with the seeded registry
    pub async fn start(&mut self) {
        let app = TestApp::new().await;
        self.observer = Some(seed_actor(&app.state.db, MembershipRole::Owner).await);
        self.app = Some(app);
        self.auth_token = None;
        self.last_response = None;
    }

    pub async fn sign_in(&mut self, role: MembershipRole) {
        let (_, token) = self.app().token_for(role).await;
        self.auth_token = Some(token);
    }

    pub fn record(&mut self, response: crate::common::TestResponse) {
        let body = serde_json::from_slice(&response.body).unwrap_or(serde_json::Value::Null);
        self.last_response = Some(TestResponse {
            status: response.status.as_u16(),
            body,
        });
    }

    pub fn last_response(&self) -> &TestResponse {
        self.last_response.as_ref().expect("No response available")
    }
}
