use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::instrument;

use palisade_domain::{DomainError, DomainResult, Role, RoleRepository};

use crate::client::PostgresClient;
use crate::conversions::{metadata_from_value, metadata_to_value};

fn role_from_row(row: &Row) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        namespace_id: row.get("namespace_id"),
        types: row.get("types"),
        metadata: metadata_from_value(row.get("metadata")),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

/// PostgreSQL implementation of RoleRepository
#[derive(Clone)]
pub struct PostgresRoleRepository {
    client: PostgresClient,
}

impl PostgresRoleRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    #[instrument(skip(self))]
    async fn get_role(&self, id: &str) -> DomainResult<Option<Role>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT id, name, namespace_id, types, metadata, created_at, updated_at
                 FROM roles WHERE id = $1",
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(role_from_row))
    }

    #[instrument(skip(self, role), fields(role_id = %role.id))]
    async fn upsert_role(&self, role: Role) -> DomainResult<Role> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let row = conn
            .query_one(
                "INSERT INTO roles (id, name, namespace_id, types, metadata, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $6)
                 ON CONFLICT (id) DO UPDATE
                 SET name = EXCLUDED.name, namespace_id = EXCLUDED.namespace_id,
                     types = EXCLUDED.types, metadata = EXCLUDED.metadata,
                     updated_at = EXCLUDED.updated_at
                 RETURNING id, name, namespace_id, types, metadata, created_at, updated_at",
                &[
                    &role.id,
                    &role.name,
                    &role.namespace_id,
                    &role.types,
                    &metadata_to_value(&role.metadata),
                    &now,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(role_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn list_roles(&self) -> DomainResult<Vec<Role>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT id, name, namespace_id, types, metadata, created_at, updated_at
                 FROM roles ORDER BY id ASC",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(role_from_row).collect())
    }
}
