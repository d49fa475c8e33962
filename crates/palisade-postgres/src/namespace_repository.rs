use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::instrument;

use palisade_domain::{DomainError, DomainResult, Namespace, NamespaceRepository};

use crate::client::PostgresClient;

fn namespace_from_row(row: &Row) -> Namespace {
    Namespace {
        id: row.get("id"),
        name: row.get("name"),
        backend: row.get("backend"),
        resource_type: row.get("resource_type"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

/// PostgreSQL implementation of NamespaceRepository
#[derive(Clone)]
pub struct PostgresNamespaceRepository {
    client: PostgresClient,
}

impl PostgresNamespaceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NamespaceRepository for PostgresNamespaceRepository {
    #[instrument(skip(self))]
    async fn get_namespace(&self, id: &str) -> DomainResult<Option<Namespace>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT id, name, backend, resource_type, created_at, updated_at
                 FROM namespaces WHERE id = $1",
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(namespace_from_row))
    }

    #[instrument(skip(self, ns), fields(namespace_id = %ns.id))]
    async fn upsert_namespace(&self, ns: Namespace) -> DomainResult<Namespace> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let row = conn
            .query_one(
                "INSERT INTO namespaces (id, name, backend, resource_type, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $5)
                 ON CONFLICT (id) DO UPDATE
                 SET name = EXCLUDED.name, backend = EXCLUDED.backend,
                     resource_type = EXCLUDED.resource_type, updated_at = EXCLUDED.updated_at
                 RETURNING id, name, backend, resource_type, created_at, updated_at",
                &[&ns.id, &ns.name, &ns.backend, &ns.resource_type, &now],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(namespace_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn list_namespaces(&self) -> DomainResult<Vec<Namespace>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT id, name, backend, resource_type, created_at, updated_at
                 FROM namespaces ORDER BY id ASC",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(namespace_from_row).collect())
    }
}
