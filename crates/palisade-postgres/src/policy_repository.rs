use async_trait::async_trait;
use tokio_postgres::Row;
use tracing::instrument;

use palisade_domain::{DomainError, DomainResult, Policy, PolicyFilter, PolicyRepository};

use crate::client::PostgresClient;

fn policy_from_row(row: &Row) -> Policy {
    Policy {
        id: row.get("id"),
        namespace_id: row.get("namespace_id"),
        role_id: row.get("role_id"),
        action_id: row.get("action_id"),
    }
}

/// PostgreSQL implementation of PolicyRepository.
///
/// Policies are content-keyed; a conflicting insert returns the stored row.
#[derive(Clone)]
pub struct PostgresPolicyRepository {
    client: PostgresClient,
}

impl PostgresPolicyRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    #[instrument(skip(self, policy), fields(namespace_id = %policy.namespace_id, role_id = %policy.role_id, action_id = %policy.action_id))]
    async fn upsert_policy(&self, policy: Policy) -> DomainResult<Policy> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // The no-op update makes RETURNING yield the existing row on conflict
        let row = conn
            .query_one(
                "INSERT INTO policies (id, namespace_id, role_id, action_id)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (namespace_id, role_id, action_id) DO UPDATE
                 SET namespace_id = EXCLUDED.namespace_id
                 RETURNING id, namespace_id, role_id, action_id",
                &[
                    &policy.id,
                    &policy.namespace_id,
                    &policy.role_id,
                    &policy.action_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(policy_from_row(&row))
    }

    #[instrument(skip(self, filter))]
    async fn list_policies(&self, filter: PolicyFilter) -> DomainResult<Vec<Policy>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = match filter.namespace_id {
            Some(namespace_id) => conn
                .query(
                    "SELECT id, namespace_id, role_id, action_id FROM policies
                     WHERE namespace_id = $1
                     ORDER BY namespace_id ASC, role_id ASC, action_id ASC",
                    &[&namespace_id],
                )
                .await ,
            None => conn
                .query(
                    "SELECT id, namespace_id, role_id, action_id FROM policies
                     ORDER BY namespace_id ASC, role_id ASC, action_id ASC",
                    &[],
                )
                .await,
        }
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(policy_from_row).collect())
    }
}
