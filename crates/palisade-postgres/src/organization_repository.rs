use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use palisade_domain::{
    CreateOrganizationInputWithId, DomainError, DomainResult, Organization,
    OrganizationRepository, UpdateOrganizationInput,
};

use crate::client::PostgresClient;
use crate::conversions::{metadata_from_value, metadata_to_value};

fn organization_from_row(row: &Row) -> Organization {
    Organization {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        metadata: metadata_from_value(row.get("metadata")),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
        deleted_at: row.get("deleted_at"),
    }
}

const ORGANIZATION_COLUMNS: &str =
    "id, name, slug, metadata, created_at, updated_at, deleted_at";

/// PostgreSQL implementation of OrganizationRepository
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    client: PostgresClient,
}

impl PostgresOrganizationRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    #[instrument(skip(self, input), fields(organization_id = %input.id))]
    async fn create_organization(
        &self,
        input: CreateOrganizationInputWithId,
    ) -> DomainResult<Organization> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let result = conn
            .execute(
                "INSERT INTO organizations (id, name, slug, metadata, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $5)",
                &[
                    &input.id,
                    &input.name,
                    &input.slug,
                    &metadata_to_value(&input.metadata),
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // PostgreSQL error code 23505 is unique_violation
                if db_err.code().code() == "23505" {
                    return Err(DomainError::OrganizationAlreadyExists(input.slug.clone()));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        debug!(organization_id = %input.id, "Organization created in database");

        Ok(Organization {
            id: input.id,
            name: input.name,
            slug: input.slug,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        })
    }

    #[instrument(skip(self), fields(organization_id = %id))]
    async fn get_organization(&self, id: Uuid) -> DomainResult<Option<Organization>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {ORGANIZATION_COLUMNS} FROM organizations
                     WHERE id = $1 AND deleted_at IS NULL"
                ),
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(organization_from_row))
    }

    #[instrument(skip(self))]
    async fn list_organizations(&self) -> DomainResult<Vec<Organization>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {ORGANIZATION_COLUMNS} FROM organizations
                     WHERE deleted_at IS NULL ORDER BY created_at ASC"
                ),
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(organization_from_row).collect())
    }

    #[instrument(skip(self, input), fields(organization_id = %input.organization_id))]
    async fn update_organization(
        &self,
        input: UpdateOrganizationInput,
    ) -> DomainResult<Organization> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE organizations SET name = $1, metadata = $2, updated_at = $3
                     WHERE id = $4 AND deleted_at IS NULL
                     RETURNING {ORGANIZATION_COLUMNS}"
                ),
                &[
                    &input.name,
                    &metadata_to_value(&input.metadata),
                    &Utc::now(),
                    &input.organization_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(ref row) => Ok(organization_from_row(row)),
            None => Err(DomainError::OrganizationNotFound(
                input.organization_id.to_string(),
            )),
        }
    }

    #[instrument(skip(self), fields(organization_id = %id))]
    async fn delete_organization(&self, id: Uuid) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows_affected = conn
            .execute(
                "UPDATE organizations SET deleted_at = $1, updated_at = $1
                 WHERE id = $2 AND deleted_at IS NULL",
                &[&Utc::now(), &id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if rows_affected == 0 {
            return Err(DomainError::OrganizationNotFound(id.to_string()));
        }
        Ok(())
    }
}
