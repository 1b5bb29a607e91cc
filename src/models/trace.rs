//! Request trace models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One handled request, recorded on a best-effort basis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub id: Uuid,
    pub method: String,
    pub route: String,
    pub actor_id: Option<Uuid>,
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TraceRecord {
    pub fn new(
        method: impl Into<String>,
        route: impl Into<String>,
        actor_id: Option<Uuid>,
        origin: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: method.into(),
            route: route.into(),
            actor_id,
            origin,
            created_at: Utc::now(),
        }
    }
}
