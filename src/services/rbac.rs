//! Access guard
//!
//! Resolves the caller's (actor, active organization) pair to a membership
//! role and maps the role to a capability set. The membership is read on
//! every call because the active organization may change between requests
//! from the same actor.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::db::{bounded, read_error, DbPool, OrganizationRepository};
use crate::models::{ActorContext, Capability, CapabilitySet, MembershipRole, ResolvedActor};
use crate::utils::PipelineError;

/// Static role to capability mapping. Unknown roles get nothing.
pub fn capabilities_for(role: &str) -> CapabilitySet {
    let granted: &[Capability] = match MembershipRole::parse(role) {
        Some(MembershipRole::Owner) | Some(MembershipRole::Admin) => {
            &[Capability::View, Capability::Write, Capability::Admin]
        }
        Some(MembershipRole::Member) | Some(MembershipRole::Editor) => {
            &[Capability::View, Capability::Write]
        }
        Some(MembershipRole::Viewer) => &[Capability::View],
        None => &[],
    };
    granted.iter().copied().collect::<HashSet<_>>()
}

#[derive(Clone)]
pub struct AccessGuard {
    pool: DbPool,
    timeout: Duration,
}

impl AccessGuard {
    pub fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Resolve the session context to exactly one (actor, organization, role)
    pub async fn resolve(&self, ctx: &ActorContext) -> Result<ResolvedActor, PipelineError> {
        let actor_id = ctx.actor_id.ok_or(PipelineError::Unauthenticated)?;
        let organization_id = ctx
            .active_organization_id
            .ok_or(PipelineError::NoActiveTenant)?;

        let pool = &self.pool;
        let membership = bounded(self.timeout, "membership lookup", async move {
            OrganizationRepository::new(pool)
                .find_membership(actor_id, organization_id)
                .await
                .map_err(read_error)
        })
        .await?;

        let role = match membership {
            Some(m) => m.role,
            None => {
                debug!(
                    actor_id = %actor_id,
                    organization_id = %organization_id,
                    "Actor has no membership in active organization"
                );
                String::new()
            }
        };

        Ok(ResolvedActor {
            actor_id,
            organization_id,
            capabilities: capabilities_for(&role),
            role,
            origin: ctx.origin.clone(),
        })
    }

    /// Resolve and require a capability
    pub async fn authorize(
        &self,
        ctx: &ActorContext,
        required: Capability,
    ) -> Result<ResolvedActor, PipelineError> {
        let actor = self.resolve(ctx).await?;
        if !actor.can(required) {
            debug!(
                actor_id = %actor.actor_id,
                role = %actor.role,
                required = required.as_str(),
                "Capability denied"
            );
            return Err(PipelineError::Forbidden(required));
        }
        Ok(actor)
    }
}
