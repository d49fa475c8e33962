use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::instrument;

use palisade_domain::{Action, ActionRepository, DomainError, DomainResult};

use crate::client::PostgresClient;

fn action_from_row(row: &Row) -> Action {
    Action {
        id: row.get("id"),
        name: row.get("name"),
        namespace_id: row.get("namespace_id"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

/// PostgreSQL implementation of ActionRepository
#[derive(Clone)]
pub struct PostgresActionRepository {
    client: PostgresClient,
}

impl PostgresActionRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionRepository for PostgresActionRepository {
    #[instrument(skip(self))]
    async fn get_action(&self, namespace_id: &str, id: &str) -> DomainResult<Option<Action>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT id, name, namespace_id, created_at, updated_at
                 FROM actions WHERE namespace_id = $1 AND id = $2",
                &[&namespace_id, &id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(action_from_row))
    }

    #[instrument(skip(self, action), fields(namespace_id = %action.namespace_id, action_id = %action.id))]
    async fn upsert_action(&self, action: Action) -> DomainResult<Action> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let row = conn
            .query_one(
                "INSERT INTO actions (id, namespace_id, name, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $4)
                 ON CONFLICT (namespace_id, id) DO UPDATE
                 SET name = EXCLUDED.name, updated_at = EXCLUDED.updated_at
                 RETURNING id, name, namespace_id, created_at, updated_at",
                &[&action.id, &action.namespace_id, &action.name, &now],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(action_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn list_actions(&self) -> DomainResult<Vec<Action>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT id, name, namespace_id, created_at, updated_at
                 FROM actions ORDER BY namespace_id ASC, id ASC",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(action_from_row).collect())
    }
}
