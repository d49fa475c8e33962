use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use palisade_domain::{
    CreateGroupInputWithId, DomainError, DomainResult, Group, GroupRepository, UpdateGroupInput,
};

use crate::client::PostgresClient;
use crate::conversions::{metadata_from_value, metadata_to_value};

fn group_from_row(row: &Row) -> Group {
    Group {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        organization_id: row.get("organization_id"),
        metadata: metadata_from_value(row.get("metadata")),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
        deleted_at: row.get("deleted_at"),
    }
}

const GROUP_COLUMNS: &str =
    "id, name, slug, organization_id, metadata, created_at, updated_at, deleted_at";

/// PostgreSQL implementation of GroupRepository
#[derive(Clone)]
pub struct PostgresGroupRepository {
    client: PostgresClient,
}

impl PostgresGroupRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    #[instrument(skip(self, input), fields(group_id = %input.id))]
    async fn create_group(&self, input: CreateGroupInputWithId) -> DomainResult<Group> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let result = conn
            .execute(
                "INSERT INTO org_groups (id, name, slug, organization_id, metadata, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $6)",
                &[
                    &input.id,
                    &input.name,
                    &input.slug,
                    &input.organization_id,
                    &metadata_to_value(&input.metadata),
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // PostgreSQL error code 23505 is unique_violation
                if db_err.code().code() == "23505" {
                    return Err(DomainError::GroupAlreadyExists(input.slug.clone()));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        debug!(group_id = %input.id, "Group created in database");

        Ok(Group {
            id: input.id,
            name: input.name,
            slug: input.slug,
            organization_id: input.organization_id,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        })
    }

    #[instrument(skip(self), fields(group_id = %id))]
    async fn get_group(&self, id: Uuid) -> DomainResult<Option<Group>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {GROUP_COLUMNS} FROM org_groups
                     WHERE id = $1 AND deleted_at IS NULL"
                ),
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(group_from_row))
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> DomainResult<Vec<Group>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {GROUP_COLUMNS} FROM org_groups
                     WHERE deleted_at IS NULL ORDER BY created_at ASC"
                ),
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(group_from_row).collect())
    }

    #[instrument(skip(self, input), fields(group_id = %input.group_id))]
    async fn update_group(&self, input: UpdateGroupInput) -> DomainResult<Group> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE org_groups SET name = $1, metadata = $2, updated_at = $3
                     WHERE id = $4 AND deleted_at IS NULL
                     RETURNING {GROUP_COLUMNS}"
                ),
                &[
                    &input.name,
                    &metadata_to_value(&input.metadata),
                    &Utc::now(),
                    &input.group_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(ref row) => Ok(group_from_row(row)),
            None => Err(DomainError::GroupNotFound(input.group_id.to_string())),
        }
    }

    #[instrument(skip(self), fields(group_id = %id))]
    async fn delete_group(&self, id: Uuid) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows_affected = conn
            .execute(
                "UPDATE org_groups SET deleted_at = $1, updated_at = $1
                 WHERE id = $2 AND deleted_at IS NULL",
                &[&Utc::now(), &id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if rows_affected == 0 {
            return Err(DomainError::GroupNotFound(id.to_string()));
        }
        Ok(())
    }
}
