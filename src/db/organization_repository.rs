//! Organization (tenant) and membership repository

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_db_timestamp, parse_db_timestamp};
use crate::models::{CreateOrganizationRequest, Membership, MembershipRole, Organization};

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    slug: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    actor_id: String,
    organization_id: String,
    role: String,
    created_at: String,
}

pub struct OrganizationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, slug, created_at, updated_at
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get organization")?;

        Ok(row.map(row_to_org))
    }

    pub async fn create(&self, req: &CreateOrganizationRequest) -> Result<Organization> {
        let id = Uuid::new_v4();
        let now = format_db_timestamp(&super::now());

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create organization")?;

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created organization")
    }

    /// Grant or change an actor's role in an organization
    pub async fn set_member(
        &self,
        organization_id: Uuid,
        actor_id: Uuid,
        role: MembershipRole,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO memberships (actor_id, organization_id, role, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (actor_id, organization_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(actor_id.to_string())
        .bind(organization_id.to_string())
        .bind(role.as_str())
        .bind(format_db_timestamp(&super::now()))
        .execute(self.pool)
        .await
        .context("Failed to set membership")?;

        Ok(())
    }

    pub async fn find_membership(
        &self,
        actor_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT actor_id, organization_id, role, created_at
            FROM memberships
            WHERE actor_id = ? AND organization_id = ?
            "#,
        )
        .bind(actor_id.to_string())
        .bind(organization_id.to_string())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(row_to_membership))
    }
}

fn row_to_org(row: OrganizationRow) -> Organization {
    Organization {
        id: Uuid::parse_str(&row.id).unwrap_or_else(|_| Uuid::nil()),
        name: row.name,
        slug: row.slug,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}

fn row_to_membership(row: MembershipRow) -> Membership {
    Membership {
        actor_id: Uuid::parse_str(&row.actor_id).unwrap_or_else(|_| Uuid::nil()),
        organization_id: Uuid::parse_str(&row.organization_id).unwrap_or_else(|_| Uuid::nil()),
        role: row.role,
        created_at: parse_db_timestamp(&row.created_at),
    }
}
