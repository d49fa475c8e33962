use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use palisade_domain::{
    CreateRelationInputWithId, DomainError, DomainResult, Relation, RelationEvent, RelationFilter,
    RelationOp, RelationTuple, SyncStatus,
};

use crate::client::PostgresClient;
use crate::conversions::{relation_op_from_str, sync_status_from_str, sync_status_to_str};

fn relation_from_row(row: &Row) -> Relation {
    Relation {
        id: row.get("id"),
        tuple: RelationTuple {
            subject_namespace_id: row.get("subject_namespace_id"),
            subject_id: row.get("subject_id"),
            object_namespace_id: row.get("object_namespace_id"),
            object_id: row.get("object_id"),
            role_id: row.get("role_id"),
        },
        sync_status: sync_status_from_str(row.get("sync_status")),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
        deleted_at: row.get("deleted_at"),
    }
}

const RELATION_COLUMNS: &str = "id, subject_namespace_id, subject_id, object_namespace_id, \
     object_id, role_id, sync_status, created_at, updated_at, deleted_at";

/// PostgreSQL implementation of RelationRepository.
///
/// Each mutation and its outbox event share one transaction; the partial
/// unique index over active rows enforces tuple uniqueness.
#[derive(Clone)]
pub struct PostgresRelationRepository {
    client: PostgresClient,
}

impl PostgresRelationRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl palisade_domain::RelationRepository for PostgresRelationRepository {
    #[instrument(skip(self), fields(relation_id = %input.id, tuple = %input.tuple))]
    async fn create_relation(&self, input: CreateRelationInputWithId) -> DomainResult<Relation> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let now = Utc::now();
        let t = &input.tuple;

        let result = tx
            .execute(
                "INSERT INTO relations (id, subject_namespace_id, subject_id, \
                 object_namespace_id, object_id, role_id, sync_status, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
                &[
                    &input.id,
                    &t.subject_namespace_id,
                    &t.subject_id,
                    &t.object_namespace_id,
                    &t.object_id,
                    &t.role_id,
                    &sync_status_to_str(SyncStatus::Pending),
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // PostgreSQL error code 23505 is unique_violation
                if db_err.code().code() == "23505" {
                    return Err(DomainError::RelationAlreadyExists(t.to_string()));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        tx.execute(
            "INSERT INTO relation_outbox (relation_id, op, subject_namespace_id, subject_id, \
             object_namespace_id, object_id, role_id, enqueued_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &input.id,
                &RelationOp::Created.as_str(),
                &t.subject_namespace_id,
                &t.subject_id,
                &t.object_namespace_id,
                &t.object_id,
                &t.role_id,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(relation_id = %input.id, "Relation created in database");

        Ok(Relation {
            id: input.id,
            tuple: input.tuple,
            sync_status: SyncStatus::Pending,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        })
    }

    #[instrument(skip(self), fields(relation_id = %id))]
    async fn get_relation(&self, id: Uuid) -> DomainResult<Option<Relation>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!("SELECT {RELATION_COLUMNS} FROM relations WHERE id = $1"),
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(relation_from_row))
    }

    #[instrument(skip(self, tuple), fields(tuple = %tuple))]
    async fn get_active_by_tuple(&self, tuple: &RelationTuple) -> DomainResult<Option<Relation>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {RELATION_COLUMNS} FROM relations
                     WHERE subject_namespace_id = $1 AND subject_id = $2
                       AND object_namespace_id = $3 AND object_id = $4
                       AND role_id = $5 AND deleted_at IS NULL"
                ),
                &[
                    &tuple.subject_namespace_id,
                    &tuple.subject_id,
                    &tuple.object_namespace_id,
                    &tuple.object_id,
                    &tuple.role_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(relation_from_row))
    }

    #[instrument(skip(self, filter))]
    async fn list_relations(&self, filter: RelationFilter) -> DomainResult<Vec<Relation>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let fields: [(&str, &Option<String>); 5] = [
            ("subject_namespace_id", &filter.subject_namespace_id),
            ("subject_id", &filter.subject_id),
            ("object_namespace_id", &filter.object_namespace_id),
            ("object_id", &filter.object_id),
            ("role_id", &filter.role_id),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                params.push(value);
                clauses.push(format!("{column} = ${}", params.len()));
            }
        }
        if filter.active_only {
            clauses.push("deleted_at IS NULL".to_string());
        }

        let mut query = format!("SELECT {RELATION_COLUMNS} FROM relations");
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY created_at ASC");

        let rows = conn
            .query(&query, &params)
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(relation_from_row).collect())
    }

    #[instrument(skip(self, tuple), fields(tuple = %tuple))]
    async fn delete_relation(&self, tuple: &RelationTuple) -> DomainResult<Relation> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let now = Utc::now();

        let row = tx
            .query_opt(
                &format!(
                    "UPDATE relations SET deleted_at = $1, updated_at = $1
                     WHERE subject_namespace_id = $2 AND subject_id = $3
                       AND object_namespace_id = $4 AND object_id = $5
                       AND role_id = $6 AND deleted_at IS NULL
                     RETURNING {RELATION_COLUMNS}"
                ),
                &[
                    &now,
                    &tuple.subject_namespace_id,
                    &tuple.subject_id,
                    &tuple.object_namespace_id,
                    &tuple.object_id,
                    &tuple.role_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let relation = match row {
            Some(ref row) => relation_from_row(row),
            None => return Err(DomainError::RelationNotFound(tuple.to_string())),
        };

        tx.execute(
            "INSERT INTO relation_outbox (relation_id, op, subject_namespace_id, subject_id, \
             object_namespace_id, object_id, role_id, enqueued_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &relation.id,
                &RelationOp::Deleted.as_str(),
                &tuple.subject_namespace_id,
                &tuple.subject_id,
                &tuple.object_namespace_id,
                &tuple.object_id,
                &tuple.role_id,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(relation_id = %relation.id, "Relation soft-deleted in database");
        Ok(relation)
    }

    #[instrument(skip(self), fields(relation_id = %id))]
    async fn mark_synced(&self, id: Uuid) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows_affected = conn
            .execute(
                "UPDATE relations SET sync_status = $1, updated_at = $2 WHERE id = $3",
                &[&sync_status_to_str(SyncStatus::Synced), &Utc::now(), &id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if rows_affected == 0 {
            return Err(DomainError::RelationNotFound(id.to_string()));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of OutboxRepository; acked events stay in the
/// table for audit.
#[derive(Clone)]
pub struct PostgresOutboxRepository {
    client: PostgresClient,
}

impl PostgresOutboxRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl palisade_domain::OutboxRepository for PostgresOutboxRepository {
    #[instrument(skip(self))]
    async fn poll_pending(&self, limit: usize) -> DomainResult<Vec<RelationEvent>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT seq, relation_id, op, subject_namespace_id, subject_id, \
                 object_namespace_id, object_id, role_id, enqueued_at
                 FROM relation_outbox
                 WHERE acked_at IS NULL
                 ORDER BY seq ASC
                 LIMIT $1",
                &[&(limit as i64)],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| RelationEvent {
                seq: row.get::<_, i64>("seq") as u64,
                relation_id: row.get("relation_id"),
                op: relation_op_from_str(row.get("op")),
                tuple: RelationTuple {
                    subject_namespace_id: row.get("subject_namespace_id"),
                    subject_id: row.get("subject_id"),
                    object_namespace_id: row.get("object_namespace_id"),
                    object_id: row.get("object_id"),
                    role_id: row.get("role_id"),
                },
                enqueued_at: row.get("enqueued_at"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn ack(&self, seq: u64) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        conn.execute(
            "UPDATE relation_outbox SET acked_at = $1 WHERE seq = $2 AND acked_at IS NULL",
            &[&Utc::now(), &(seq as i64)],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn pending_count(&self) -> DomainResult<u64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_one(
                "SELECT COUNT(*) AS pending FROM relation_outbox WHERE acked_at IS NULL",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.get::<_, i64>("pending") as u64)
    }
}
