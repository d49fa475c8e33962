use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use palisade_domain::{
    CreateResourceInputWithId, DomainError, DomainResult, Resource, ResourceRepository,
    UpdateResourceInput,
};

use crate::client::PostgresClient;
use crate::conversions::{metadata_from_value, metadata_to_value};

fn resource_from_row(row: &Row) -> Resource {
    Resource {
        id: row.get("id"),
        name: row.get("name"),
        urn: row.get("urn"),
        namespace_id: row.get("namespace_id"),
        project_id: row.get("project_id"),
        organization_id: row.get("organization_id"),
        metadata: metadata_from_value(row.get("metadata")),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
        deleted_at: row.get("deleted_at"),
    }
}

const RESOURCE_COLUMNS: &str = "id, name, urn, namespace_id, project_id, organization_id, \
     metadata, created_at, updated_at, deleted_at";

/// PostgreSQL implementation of ResourceRepository
#[derive(Clone)]
pub struct PostgresResourceRepository {
    client: PostgresClient,
}

impl PostgresResourceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceRepository for PostgresResourceRepository {
    #[instrument(skip(self, input), fields(resource_id = %input.id, urn = %input.urn))]
    async fn create_resource(&self, input: CreateResourceInputWithId) -> DomainResult<Resource> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let result = conn
            .execute(
                "INSERT INTO resources (id, name, urn, namespace_id, project_id, \
                 organization_id, metadata, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
                &[
                    &input.id,
                    &input.name,
                    &input.urn,
                    &input.namespace_id,
                    &input.project_id,
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
                    return Err(DomainError::ResourceAlreadyExists(input.urn.clone()));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        debug!(resource_id = %input.id, "Resource created in database");

        Ok(Resource {
            id: input.id,
            name: input.name,
            urn: input.urn,
            namespace_id: input.namespace_id,
            project_id: input.project_id,
            organization_id: input.organization_id,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        })
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn get_resource(&self, id: Uuid) -> DomainResult<Option<Resource>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {RESOURCE_COLUMNS} FROM resources
                     WHERE id = $1 AND deleted_at IS NULL"
                ),
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(resource_from_row))
    }

    #[instrument(skip(self, urn))]
    async fn get_resource_by_urn(&self, urn: &str) -> DomainResult<Option<Resource>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {RESOURCE_COLUMNS} FROM resources
                     WHERE urn = $1 AND deleted_at IS NULL"
                ),
                &[&urn],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(resource_from_row))
    }

    #[instrument(skip(self))]
    async fn list_resources(&self) -> DomainResult<Vec<Resource>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {RESOURCE_COLUMNS} FROM resources
                     WHERE deleted_at IS NULL ORDER BY created_at ASC"
                ),
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(resource_from_row).collect())
    }

    #[instrument(skip(self, input), fields(resource_id = %input.resource_id))]
    async fn update_resource(&self, input: UpdateResourceInput) -> DomainResult<Resource> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE resources SET name = $1, metadata = $2, updated_at = $3
                     WHERE id = $4 AND deleted_at IS NULL
                     RETURNING {RESOURCE_COLUMNS}"
                ),
                &[
                    &input.name,
                    &metadata_to_value(&input.metadata),
                    &Utc::now(),
                    &input.resource_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(ref row) => Ok(resource_from_row(row)),
            None => Err(DomainError::ResourceNotFound(input.resource_id.to_string())),
        }
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn delete_resource(&self, id: Uuid) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows_affected = conn
            .execute(
                "UPDATE resources SET deleted_at = $1, updated_at = $1
                 WHERE id = $2 AND deleted_at IS NULL",
                &[&Utc::now(), &id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if rows_affected == 0 {
            return Err(DomainError::ResourceNotFound(id.to_string()));
        }
        Ok(())
    }
}
