//! Organization (tenant) and membership models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub slug: String,
}

/// Role an actor holds inside one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Owner,
    Admin,
    Member,
    Editor,
    Viewer,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
            MembershipRole::Editor => "editor",
            MembershipRole::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MembershipRole::Owner),
            "admin" => Some(MembershipRole::Admin),
            "member" => Some(MembershipRole::Member),
            "editor" => Some(MembershipRole::Editor),
            "viewer" => Some(MembershipRole::Viewer),
            _ => None,
        }
    }
}

/// Membership row as stored; the role is kept as text so roles added by
/// other tooling do not break lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub actor_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Capabilities granted by a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    View,
    Write,
    Admin,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Write => "write",
            Capability::Admin => "admin",
        }
    }
}

pub type CapabilitySet = HashSet<Capability>;

/// Session context supplied by the authentication layer on every call.
///
/// The active organization travels with the request instead of living in
/// any process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContext {
    pub actor_id: Option<Uuid>,
    pub active_organization_id: Option<Uuid>,
    /// Network origin of the request (client address)
    pub origin: Option<String>,
}

impl ActorContext {
    pub fn anonymous(origin: Option<String>) -> Self {
        Self {
            actor_id: None,
            active_organization_id: None,
            origin,
        }
    }

    pub fn new(actor_id: Uuid, active_organization_id: Option<Uuid>) -> Self {
        Self {
            actor_id: Some(actor_id),
            active_organization_id,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Fully resolved (actor, active organization, role) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedActor {
    pub actor_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub capabilities: CapabilitySet,
    pub origin: Option<String>,
}

impl ResolvedActor {
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
