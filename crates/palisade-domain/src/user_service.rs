use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::metadata::validate_metadata_keys;
use crate::repository::UserRepository;
use crate::user::{
    CreateMetadataKeyInput, CreateUserInput, CreateUserInputWithId, UpdateUserInput, User,
    UserMetadataKey,
};

/// Domain service for users.
///
/// User metadata is restricted to the server-registered key allow-list;
/// unknown keys are rejected with `UnknownMetadataKey`.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    async fn validate_metadata(
        &self,
        metadata: &crate::metadata::Metadata,
    ) -> DomainResult<()> {
        if metadata.is_empty() {
            return Ok(());
        }
        let allowed: Vec<String> = self
            .repository
            .list_metadata_keys()
            .await?
            .into_iter()
            .map(|k| k.key)
            .collect();
        validate_metadata_keys(metadata, &allowed)
    }

    pub async fn create(&self, input: CreateUserInput) -> DomainResult<User> {
        if input.email.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "user email cannot be empty".to_string(),
            ));
        }
        self.validate_metadata(&input.metadata).await?;
        debug!(email = %input.email, "Creating user");

        if self
            .repository
            .get_user_by_email(&input.email)
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists(input.email));
        }

        let user = self
            .repository
            .create_user(CreateUserInputWithId {
                id: Uuid::new_v4(),
                name: input.name,
                email: input.email,
                metadata: input.metadata,
            })
            .await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<User> {
        self.repository
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    pub async fn get_by_email(&self, email: &str) -> DomainResult<User> {
        self.repository
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))
    }

    pub async fn list(&self) -> DomainResult<Vec<User>> {
        self.repository.list_users().await
    }

    pub async fn update(&self, input: UpdateUserInput) -> DomainResult<User> {
        self.validate_metadata(&input.metadata).await?;
        let user = self.repository.update_user(input).await?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Register a metadata key users may set
    pub async fn create_metadata_key(
        &self,
        input: CreateMetadataKeyInput,
    ) -> DomainResult<UserMetadataKey> {
        if input.key.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "metadata key cannot be empty".to_string(),
            ));
        }
        let key = self
            .repository
            .create_metadata_key(UserMetadataKey {
                key: input.key,
                description: input.description,
                created_at: None,
                updated_at: None,
            })
            .await?;
        info!(key = %key.key, "User metadata key registered");
        Ok(key)
    }
}
