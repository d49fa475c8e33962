use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use palisade_domain::{
    CreateUserInputWithId, DomainError, DomainResult, UpdateUserInput, User, UserMetadataKey,
    UserRepository,
};

use crate::client::PostgresClient;
use crate::conversions::{metadata_from_value, metadata_to_value};

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        metadata: metadata_from_value(row.get("metadata")),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
        deleted_at: row.get("deleted_at"),
    }
}

fn metadata_key_from_row(row: &Row) -> UserMetadataKey {
    UserMetadataKey {
        key: row.get("key"),
        description: row.get("description"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

const USER_COLUMNS: &str = "id, name, email, metadata, created_at, updated_at, deleted_at";

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PostgresUserRepository {
    client: PostgresClient,
}

impl PostgresUserRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, input), fields(user_id = %input.id))]
    async fn create_user(&self, input: CreateUserInputWithId) -> DomainResult<User> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let result = conn
            .execute(
                "INSERT INTO users (id, name, email, metadata, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $5)",
                &[
                    &input.id,
                    &input.name,
                    &input.email,
                    &metadata_to_value(&input.metadata),
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // PostgreSQL error code 23505 is unique_violation
                if db_err.code().code() == "23505" {
                    return Err(DomainError::UserAlreadyExists(input.email.clone()));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        debug!(user_id = %input.id, "User created in database");

        Ok(User {
            id: input.id,
            name: input.name,
            email: input.email,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        })
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"),
                &[&id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self, email))]
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
                ),
                &[&email],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE deleted_at IS NULL ORDER BY created_at ASC"
                ),
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn update_user(&self, input: UpdateUserInput) -> DomainResult<User> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE users SET name = $1, metadata = $2, updated_at = $3
                     WHERE id = $4 AND deleted_at IS NULL
                     RETURNING {USER_COLUMNS}"
                ),
                &[
                    &input.name,
                    &metadata_to_value(&input.metadata),
                    &Utc::now(),
                    &input.user_id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(ref row) => Ok(user_from_row(row)),
            None => Err(DomainError::UserNotFound(input.user_id.to_string())),
        }
    }

    #[instrument(skip(self, key), fields(key = %key.key))]
    async fn create_metadata_key(&self, key: UserMetadataKey) -> DomainResult<UserMetadataKey> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();
        let row = conn
            .query_one(
                "INSERT INTO user_metadata_keys (key, description, created_at, updated_at)
                 VALUES ($1, $2, $3, $3)
                 ON CONFLICT (key) DO UPDATE
                 SET description = EXCLUDED.description, updated_at = EXCLUDED.updated_at
                 RETURNING key, description, created_at, updated_at",
                &[&key.key, &key.description, &now],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(metadata_key_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn list_metadata_keys(&self) -> DomainResult<Vec<UserMetadataKey>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT key, description, created_at, updated_at
                 FROM user_metadata_keys ORDER BY key ASC",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(metadata_key_from_row).collect())
    }
}
